use std::fs::File;
use std::io::Write;
use std::time::Instant;

use log::{Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

/// Writes to the log file when one was given, stderr otherwise.
struct CmdtreeLogger {
    file: Option<Mutex<File>>,
    filter: log::LevelFilter,
    start: Instant,
}

impl CmdtreeLogger {
    fn line(&self, record: &Record) -> String {
        let elapsed = self.start.elapsed().as_secs_f64();
        format!(
            "[{elapsed:.3}s] [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for CmdtreeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.line(record);
        match self.file {
            Some(ref file) => {
                let _ = writeln!(file.lock(), "{line}");
            }
            None => eprintln!("{line}"),
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Level filter from `RUST_LOG`, `warn` when unset or unparsable.
fn level_from_env() -> log::LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Warn)
}

/// Install the global logger.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init(log_file: Option<File>) -> Result<(), SetLoggerError> {
    let filter = level_from_env();
    let logger = CmdtreeLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
