//! Logging on stderr via tracing-subscriber.
//!
//! The report owns stdout, so `--json` output can be piped as-is.
//!
//! Level precedence: a level given on the command line (`--log-level`, `-v`)
//! beats `RUST_LOG`, which beats `[app].log_level` / `ICMARK_LOG_LEVEL`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Level implied by repeated `-v` flags. `None` when no flag was given.
pub fn verbosity_level(count: u8) -> Option<&'static str> {
    match count {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Build the subscriber filter.
///
/// With `from_cli`, `level` wins and `RUST_LOG` only covers an unusable
/// `level`. Otherwise `RUST_LOG` wins and `level` is the fallback.
pub fn build_filter(level: &str, from_cli: bool) -> Result<EnvFilter, AppError> {
    let explicit = EnvFilter::try_new(level);
    let from_env = EnvFilter::try_from_default_env();

    match (from_cli, explicit, from_env) {
        (true, Ok(filter), _) | (false, _, Ok(filter)) => Ok(filter),
        (true, Err(_), Ok(filter)) | (false, Ok(filter), Err(_)) => Ok(filter),
        (_, Err(e), _) => Err(AppError::Logger(format!("invalid log level '{level}': {e}"))),
    }
}

/// Install the global subscriber. Call once, after the CLI and config are read.
pub fn init(level: &str, from_cli: bool) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level, from_cli)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Accepts `off`, `error`, `warn`, `info`, `debug`, `trace` in any case.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_levels_parse() {
        for l in ["off", "error", "warn", "info", "debug", "trace", "DEBUG", " info "] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
        assert_eq!(parse_level("warn").unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn invalid_level_errors() {
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
        assert!(parse_level("   ").is_err());
    }

    #[test]
    fn verbosity_flags_map_to_levels() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some("debug"));
        assert_eq!(verbosity_level(4), Some("trace"));
    }

    #[test]
    fn cli_level_beats_environment() {
        let filter = build_filter("trace", true).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn init_succeeds_or_already_init() {
        // Another test in this process may have installed the subscriber first.
        match init("warn", true) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
