//! Command line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Run crawl monitors against a job's stats and report the outcome.
#[derive(Parser, Debug, Clone)]
#[command(name = "vigil", version, about)]
pub struct Cli {
    /// JSON file with the job stats.
    #[arg(long)]
    pub stats: PathBuf,

    /// Settings file (YAML, JSON or TOML). `VIGIL__<KEY>` variables override it.
    #[arg(long, env = "VIGIL_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Suite or monitor definition to run instead of the stock suite.
    #[arg(long)]
    pub definition: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Run the periodic suite instead of the spider close suite.
    #[arg(long, conflicts_with = "definition")]
    pub periodic: bool,

    /// Scrapy Cloud project; enables the jobs comparison monitor.
    #[arg(long, env = "SHUB_JOBS_PROJECT", requires = "api_key")]
    pub jobs_project: Option<String>,

    /// Spider whose previous jobs are compared.
    #[arg(long, requires = "jobs_project")]
    pub spider: Option<String>,

    /// Scrapy Cloud API key.
    #[arg(long, env = "SH_APIKEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["vigil", "--stats", "stats.json"]).unwrap();
        assert_eq!(cli.stats, PathBuf::from("stats.json"));
        assert_eq!(cli.format, Format::Text);
        assert!(!cli.periodic);
        assert!(cli.definition.is_none());
    }

    #[test]
    fn test_format_and_definition() {
        let cli = Cli::try_parse_from([
            "vigil",
            "--stats",
            "stats.json",
            "--definition",
            "suite.yaml",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.definition, Some(PathBuf::from("suite.yaml")));
    }

    #[test]
    fn test_periodic_conflicts_with_definition() {
        let result = Cli::try_parse_from([
            "vigil",
            "--stats",
            "stats.json",
            "--definition",
            "suite.yaml",
            "--periodic",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_is_required() {
        assert!(Cli::try_parse_from(["vigil"]).is_err());
    }
}
