//! Logging CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Default, Args, Clone, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)] // CLI-only, count action doesn't make sense in config
    pub verbosity: u8,

    /// Log filter directive (e.g., "mlcache_engine=debug").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,
}

impl LogArgs {
    /// Base level implied by `--quiet` and the verbosity count.
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        logs: LogArgs,
    }

    #[test]
    fn test_levels() {
        assert_eq!(TestCli::parse_from(["test"]).logs.level(), "info");
        assert_eq!(TestCli::parse_from(["test", "-v"]).logs.level(), "debug");
        assert_eq!(TestCli::parse_from(["test", "-vvv"]).logs.level(), "trace");
        assert_eq!(TestCli::parse_from(["test", "-q", "-vv"]).logs.level(), "error");
    }

    #[test]
    fn test_filter_and_json() {
        let cli = TestCli::parse_from(["test", "--log.filter", "mlcache_engine=trace", "--log.json"]);
        assert_eq!(cli.logs.filter.as_deref(), Some("mlcache_engine=trace"));
        assert!(cli.logs.json);
    }

    #[test]
    fn test_serde_skips_verbosity() {
        let args = LogArgs {
            verbosity: 3,
            ..LogArgs::default()
        };
        let json = serde_json::to_value(&args).unwrap();
        assert!(json.get("verbosity").is_none());
        assert!(json.get("filter").is_none());

        let back: LogArgs = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(back.json);
        assert!(!back.quiet);
    }
}
