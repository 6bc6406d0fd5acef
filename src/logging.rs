//! Diagnostic logging setup.
//!
//! Events go to **stderr** through `tracing-subscriber`; stdout is reserved
//! for results. `RUST_LOG` applies unless `--verbose` or `--quiet` is given.

use tracing_subscriber::EnvFilter;

/// Verbosity requested on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Verbosity::Verbose,
            (false, true) => Verbosity::Quiet,
            (false, false) => Verbosity::Normal,
        }
    }

    fn filter(self) -> EnvFilter {
        match self {
            Verbosity::Verbose => EnvFilter::new("workflow_meta=debug,wfm=debug"),
            Verbosity::Quiet => EnvFilter::new("error"),
            Verbosity::Normal => {
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
            }
        }
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(verbosity.filter())
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .try_init();
}
