use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*, registry::LookupSpan};

/// Console level: nothing with `--quiet`, warnings by default, one step per `-v`.
fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::OFF,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Plain-text layer for `--log-file`, tagged with thread ids since trajectories run on the
/// rayon pool.
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let log_file = log_file.map(File::create).transpose()?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // The log file keeps the verbosity level even when the console is silenced.
    tracing_subscriber::registry()
        .with(console.with_filter(console_level(verbosity, quiet)))
        .with(log_file.map(|file| file_layer(file).with_filter(console_level(verbosity, false))))
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, trace};

    #[test]
    fn quiet_silences_every_level() {
        assert_eq!(console_level(0, true), LevelFilter::OFF);
        assert_eq!(console_level(3, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn quiet_console_filter_drops_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiet.log");
        let file = File::create(&path).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(file_layer(file).with_filter(console_level(2, true)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("Trajectory failed.");
            info!("Trajectory finished.");
        });

        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn each_flag_lowers_the_console_level() {
        let levels: Vec<_> = (0..5).map(|v| console_level(v, false)).collect();
        assert_eq!(
            levels,
            [
                LevelFilter::WARN,
                LevelFilter::INFO,
                LevelFilter::DEBUG,
                LevelFilter::TRACE,
                LevelFilter::TRACE,
            ]
        );
    }

    #[test]
    #[serial]
    fn file_layer_records_fields_without_escape_codes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hopkmc.log");
        let subscriber =
            tracing_subscriber::registry().with(file_layer(File::create(&path).unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            info!(trajectory = 2, hops = 41, "Trajectory finished.");
            trace!("Rate table rebuilt.");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Trajectory finished."));
        assert!(content.contains("trajectory=2"));
        assert!(content.contains("hops=41"));
        assert!(content.contains("TRACE"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn unwritable_log_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            setup_logging(1, false, Some(dir.path())),
            Err(CliError::Io(_))
        ));
    }

    #[test]
    #[serial]
    fn global_logger_installs_once() {
        let first = setup_logging(2, false, None);
        debug!("Global logger installed.");
        let second = setup_logging(0, false, None);
        assert!(first.is_ok());
        assert!(matches!(second, Err(CliError::Other(_))));
    }
}
