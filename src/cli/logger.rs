// Logging setup for the CLI
use std::io::Write;

/// Initialize env_logger from the --verbose/--quiet flags
///
/// A set `RUST_LOG` takes over completely.
pub fn init_logger(verbose: bool, quiet: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }

    let default_level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();

    builder.filter_level(default_level).format(|buf, record| {
        if record.level() <= log::Level::Debug {
            writeln!(buf, "[{}] {}", record.level(), record.args())
        } else {
            writeln!(buf, "{}", record.args())
        }
    });

    // Debug output only from this crate when verbose
    if verbose {
        builder.filter_module("crossref_index", log::LevelFilter::Debug);
        builder.filter_module("hyper", log::LevelFilter::Info);
        builder.filter_module("tokio", log::LevelFilter::Info);
    }

    builder.init();
}
