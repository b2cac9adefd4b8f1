// Logging setup: -v flags pick the level, RUST_LOG still wins when set.
use clap::Args;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Args, Debug, Clone, Default)]
pub struct LoggingOpts {
    /// A level of verbosity, and can be used multiple times
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl LoggingOpts {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global subscriber. Logs go to stderr so stdout stays clean for reports.
    pub fn init(&self) {
        let filter = EnvFilter::builder()
            .with_default_directive(self.to_level_filter().into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let level = |verbose| LoggingOpts { verbose }.to_level_filter();
        assert_eq!(level(0), LevelFilter::WARN);
        assert_eq!(level(1), LevelFilter::INFO);
        assert_eq!(level(2), LevelFilter::DEBUG);
        assert_eq!(level(7), LevelFilter::TRACE);
    }
}
