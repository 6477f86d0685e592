//! Log output for the command line. Events go to stderr so that commands
//! printing results (`search`, `tags`, `stats`) keep stdout clean.

use tracing_subscriber::EnvFilter;

/// Overrides the verbosity flags with a full filter, e.g.
/// `TECHBLOG_LOG=techblog=debug`.
pub const LOG_ENV: &str = "TECHBLOG_LOG";

/// Maps the number of `-v` flags to a filter directive.
pub const fn verbosity_to_directive(verbosity: u64) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: u64) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_verbosity_to_directive() {
        assert_eq!("warn", verbosity_to_directive(0));
        assert_eq!("info", verbosity_to_directive(1));
        assert_eq!("debug", verbosity_to_directive(2));
        assert_eq!("trace", verbosity_to_directive(7));
    }

    #[test]
    fn test_init_twice() {
        init_logging(0);
        init_logging(3);
    }
}
