//! Console logging setup.
//!
//! Logs go to stderr so stdout stays clean for summaries and plots.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a `-v` count and `-q` flag.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn,trends_adjust=info",
        1 => "info,trends_adjust=debug",
        _ => "debug,trends_adjust=trace",
    }
}

/// Initialize the global subscriber. `RUST_LOG` overrides the flag-derived level.
pub fn init_logging(verbose: u8, quiet: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .with_file(false);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(env_filter).with(console_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(default_directive(3, true), "error");
        assert_eq!(default_directive(0, false), "warn,trends_adjust=info");
        assert_eq!(default_directive(2, false), "debug,trends_adjust=trace");
    }
}
