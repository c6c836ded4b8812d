use crate::report::{run_summary_report, SummaryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sales_insight::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sales Insight",
    about = "Summarize sales data from the command line or serve summaries over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print descriptive and inferential statistics for a sales CSV
    Summary(SummaryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Summary(args) => run_summary_report(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn summary_accepts_comparison_and_filters() {
        let cli = Cli::try_parse_from([
            "sales-insight",
            "summary",
            "--field",
            "revenue",
            "--category",
            "Home",
            "--category",
            "Sports",
            "--compare",
            "Home",
            "Sports",
        ])
        .expect("arguments parse");

        let Some(Command::Summary(args)) = cli.command else {
            panic!("expected summary command");
        };
        assert_eq!(args.field, "revenue");
        assert_eq!(args.categories, vec!["Home", "Sports"]);
        assert_eq!(
            args.compare,
            Some(vec!["Home".to_string(), "Sports".to_string()])
        );
    }

    #[test]
    fn test_mean_conflicts_with_compare() {
        let result = Cli::try_parse_from([
            "sales-insight",
            "summary",
            "--test-mean",
            "20",
            "--compare",
            "Home",
            "Sports",
        ]);
        assert!(result.is_err());
    }
}
