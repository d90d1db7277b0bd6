//! Structured logging setup for the command-line tools

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How much the tools report while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Progress messages
    #[default]
    Normal,
    /// Per-step detail
    Verbose,
}

impl Verbosity {
    /// Pick a verbosity from the `--quiet` and `--verbose` flags; quiet wins
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    /// Most detailed level that is emitted
    pub const fn level(self) -> Level {
        match self {
            Self::Quiet => Level::WARN,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global stderr subscriber
///
/// `RUST_LOG`, when set, overrides the level chosen by `verbosity`. Returns
/// `false` if a subscriber was already installed, in which case nothing
/// changes.
pub fn init_logging(verbosity: Verbosity) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level().as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
