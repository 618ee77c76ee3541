//! Subscriber initialization.

use eyre::{Result, eyre};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::LogArgs;

/// Build the filter for the given arguments.
///
/// Precedence:
/// 1. `--quiet` shows errors only
/// 2. Otherwise `RUST_LOG` if set, else the level implied by `-v`
/// 3. Directives from `--log.filter` are added on top
///
/// Directives that fail to parse are returned alongside the filter so the
/// caller can report them once a subscriber is installed.
pub fn build_filter(args: &LogArgs) -> (EnvFilter, Vec<String>) {
    if args.quiet {
        return (EnvFilter::new(args.level()), Vec::new());
    }

    let base =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level()));
    add_directives(base, args.filter.as_deref())
}

/// Add comma-separated directives to `filter`, collecting the ones that fail
/// to parse.
fn add_directives(mut filter: EnvFilter, custom: Option<&str>) -> (EnvFilter, Vec<String>) {
    let mut rejected = Vec::new();

    if let Some(custom) = custom {
        for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(_) => rejected.push(directive.to_string()),
            }
        }
    }

    (filter, rejected)
}

/// Install the global subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let (filter, rejected) = build_filter(args);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).without_time();

    if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|err| eyre!("failed to install tracing subscriber: {err}"))?;

    for directive in rejected {
        warn!(%directive, "ignoring invalid log filter directive");
    }
    Ok(())
}
