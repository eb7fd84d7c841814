use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initializes `env_logger` for the binary.
///
/// Log lines go to stderr so stdout only carries the build summary.
/// `--verbose` raises the level to `Debug`; `RUST_LOG` still takes precedence.
pub fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    Builder::new()
        .filter_level(level)
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_target(verbose)
        .parse_default_env()
        .init();
}
