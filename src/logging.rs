//! Process-wide logger that fans records out to named sinks, each with its
//! own level filter.

use crate::utils::timestamp_millis;
use crate::DynResult;
use log::{LevelFilter, Log, Metadata, Record};
use std::fmt::{self, Display, Formatter};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, Once, RwLock, RwLockReadGuard, RwLockWriteGuard};

const CRATE_PREFIX: &str = "ipinvite";

pub trait LogSink: Send + Sync {
    /// Sinks are replaced and reconfigured by name.
    fn name(&self) -> String;
    fn write_line(&self, line: &str) -> DynResult<()>;
    fn flush(&self) -> DynResult<()> {
        Ok(())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SinkFilter {
    level: LevelFilter,
    crate_only: bool,
}

impl SinkFilter {
    pub fn new(level: LevelFilter) -> Self {
        SinkFilter {
            level,
            crate_only: true,
        }
    }

    pub fn off() -> Self {
        SinkFilter::new(LevelFilter::Off)
    }

    /// Also pass records from dependencies such as tokio.
    pub fn including_dependencies(mut self) -> Self {
        self.crate_only = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.level != LevelFilter::Off
    }

    pub fn allows_level(&self, meta: &Metadata) -> bool {
        meta.level() <= self.level
    }

    pub fn allows(&self, record: &Record) -> bool {
        let from_crate = record
            .module_path()
            .map(|path| path.starts_with(CRATE_PREFIX))
            .unwrap_or(false);
        self.allows_level(record.metadata()) && (from_crate || !self.crate_only)
    }
}

struct Registered {
    filter: SinkFilter,
    sink: Box<dyn LogSink>,
}

fn read_ignoring_poison<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_ignoring_poison<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn lock_ignoring_poison<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// Some other logger already owns the `log` facade.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LoggerTaken;

impl Display for LoggerTaken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Another logger is already installed.")
    }
}

impl std::error::Error for LoggerTaken {}

pub struct InviteLogger {
    sinks: RwLock<Vec<Registered>>,
}

lazy_static::lazy_static! {
    static ref LOGGER: InviteLogger = InviteLogger::new();
}

static INSTALL: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

fn install(logger: &'static InviteLogger) -> Result<(), LoggerTaken> {
    log::set_logger(logger).map_err(|_e| LoggerTaken)?;
    // Filtering happens per sink.
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

impl InviteLogger {
    fn new() -> Self {
        InviteLogger {
            sinks: RwLock::new(Vec::new()),
        }
    }

    /// The global logger, installed into `log` on first use. Fails on every
    /// call if another logger got there first.
    pub fn global() -> Result<&'static InviteLogger, LoggerTaken> {
        INSTALL.call_once(|| match install(&LOGGER) {
            Ok(()) => INSTALLED.store(true, Ordering::SeqCst),
            Err(e) => eprintln!("WARNING: {} ipinvite log output is disabled.", e),
        });
        if INSTALLED.load(Ordering::SeqCst) {
            Ok(&*LOGGER)
        } else {
            Err(LoggerTaken)
        }
    }

    /// Adds `sink`, replacing any sink with the same name.
    pub fn add_sink<S: LogSink + 'static>(&self, sink: S, filter: SinkFilter) {
        let mut sinks = write_ignoring_poison(&self.sinks);
        let name = sink.name();
        sinks.retain(|reg| reg.sink.name() != name);
        sinks.push(Registered {
            filter,
            sink: Box::new(sink),
        });
    }

    /// Swaps in a new filter for the sink called `name` and returns the old
    /// one, or `None` if no such sink exists.
    pub fn set_filter(&self, name: &str, filter: SinkFilter) -> Option<SinkFilter> {
        let mut sinks = write_ignoring_poison(&self.sinks);
        let reg = sinks.iter_mut().find(|reg| reg.sink.name() == name)?;
        Some(std::mem::replace(&mut reg.filter, filter))
    }

    pub fn filter_for(&self, name: &str) -> Option<SinkFilter> {
        let sinks = read_ignoring_poison(&self.sinks);
        sinks
            .iter()
            .find(|reg| reg.sink.name() == name)
            .map(|reg| reg.filter)
    }
}

impl Log for InviteLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sinks = read_ignoring_poison(&self.sinks);
        sinks.iter().any(|reg| reg.filter.allows_level(metadata))
    }

    fn log(&self, record: &Record) {
        let sinks = read_ignoring_poison(&self.sinks);
        if !sinks.iter().any(|reg| reg.filter.allows(record)) {
            return;
        }
        let line = format!(
            "{} [{}] {}: {}",
            timestamp_millis(),
            record.level(),
            record.target(),
            record.args()
        );
        let failed: Vec<(String, String)> = sinks
            .iter()
            .filter(|reg| reg.filter.allows(record))
            .filter_map(|reg| {
                reg.sink
                    .write_line(&line)
                    .err()
                    .map(|e| (reg.sink.name(), e.to_string()))
            })
            .collect();
        for (name, err) in failed {
            let report = format!("{} [ERROR] {}: sink {} failed: {}", timestamp_millis(), CRATE_PREFIX, name, err);
            for reg in sinks.iter().filter(|reg| reg.sink.name() != name) {
                if let Err(_e) = reg.sink.write_line(&report) {}
            }
        }
    }

    fn flush(&self) {
        let sinks = read_ignoring_poison(&self.sinks);
        for reg in sinks.iter() {
            if let Err(_e) = reg.sink.flush() {}
        }
    }
}

pub struct StderrSink;

impl LogSink for StderrSink {
    fn name(&self) -> String {
        "stderr".to_owned()
    }
    fn write_line(&self, line: &str) -> DynResult<()> {
        let stderr = std::io::stderr();
        let mut lock = stderr.lock();
        writeln!(lock, "{}", line)?;
        Ok(())
    }
    fn flush(&self) -> DynResult<()> {
        std::io::stderr().flush()?;
        Ok(())
    }
}

/// Appends lines to a file, creating it if needed.
pub struct FileSink {
    path: PathBuf,
    output: Mutex<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_owned();
        let output = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(FileSink {
            path,
            output: Mutex::new(output),
        })
    }
}

impl LogSink for FileSink {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
    fn write_line(&self, line: &str) -> DynResult<()> {
        let mut output = lock_ignoring_poison(&self.output);
        writeln!(output, "{}", line)?;
        Ok(())
    }
    fn flush(&self) -> DynResult<()> {
        lock_ignoring_poison(&self.output).flush()?;
        Ok(())
    }
}

/// Maps a `-v` count onto a level, starting from warnings.
pub fn verbosity_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Sends this crate's records at `level` or above to stderr, and to
/// `log_file` as well when one is given.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> DynResult<()> {
    let logger = InviteLogger::global()?;
    logger.add_sink(StderrSink, SinkFilter::new(level));
    if let Some(path) = log_file {
        logger.add_sink(FileSink::open(path)?, SinkFilter::new(level));
        log::info!("Also logging to {}", path.display());
    }
    Ok(())
}
