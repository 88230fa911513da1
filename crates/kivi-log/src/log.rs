use std::{
    io::Write,
    sync::{OnceLock, Mutex, MutexGuard},
};

use termcolor::{WriteColor, StandardStream, ColorChoice};

pub use termcolor::{ColorSpec, Color};

use crate::*;

use crate::fmt::SegmentSpec;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CustomFmt(u32);

impl CustomFmt {

    #[inline(always)]
    pub fn index(self) -> u32 {
        self.0
    }
}

pub enum LevelFmt {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Other(CustomFmt, Level),
}

impl LevelFmt {

    #[inline(always)]
    pub fn level(&self) -> Level {
        match *self {
            Self::Error => Level::Error,
            Self::Warn => Level::Warn,
            Self::Info => Level::Info,
            Self::Debug => Level::Debug,
            Self::Trace => Level::Trace,
            Self::Other(_, level) => level,
        }
    }
}

struct Logger {
    stderr: StandardStream,
    info_fmt: LogFmt,
    warn_fmt: LogFmt,
    error_fmt: LogFmt,
    debug_fmt: LogFmt,
    trace_fmt: LogFmt,
    custom_fmt: Vec<LogFmt>,
}

impl Logger {

    #[inline(always)]
    fn new() -> Self {
        Self {
            stderr: StandardStream::stderr(ColorChoice::Auto),
            info_fmt: LogFmt::for_level(Level::Info),
            warn_fmt: LogFmt::for_level(Level::Warn),
            error_fmt: LogFmt::for_level(Level::Error),
            debug_fmt: LogFmt::for_level(Level::Debug),
            trace_fmt: LogFmt::for_level(Level::Trace),
            custom_fmt: Vec::new(),
        }
    }

    fn select(&self, level: &LevelFmt) -> Result<&LogFmt> {
        Ok(match level {
            LevelFmt::Error => &self.error_fmt,
            LevelFmt::Warn => &self.warn_fmt,
            LevelFmt::Info => &self.info_fmt,
            LevelFmt::Debug => &self.debug_fmt,
            LevelFmt::Trace => &self.trace_fmt,
            LevelFmt::Other(fmt, _) => self.custom_fmt
                .get(fmt.0 as usize)
                .ok_or(LogError::UnknownFormat(*fmt))?,
        })
    }

    fn write(&mut self, level: &LevelFmt, msg: core::fmt::Arguments) -> Result<()> {
        // The format is cloned out so `stderr` can be borrowed mutably below.
        let fmt = self.select(level)?.clone();
        for segment in &fmt {
            match segment {
                SegmentSpec::Message(log_spec) => {
                    if let Some(color_spec) = &log_spec.color_spec {
                        self.stderr.set_color(color_spec)?;
                        write!(self.stderr, "{}", msg)?;
                        self.stderr.reset()?;
                    } else {
                        write!(self.stderr, "{}", msg)?;
                    }
                },
                SegmentSpec::Text(text, log_spec) => {
                    if let Some(color_spec) = &log_spec.color_spec {
                        self.stderr.set_color(color_spec)?;
                        self.stderr.write_all(text.as_bytes())?;
                        self.stderr.reset()?;
                    } else {
                        self.stderr.write_all(text.as_bytes())?;
                    }
                },
            }
        }
        self.stderr.write_all(b"\n")?;
        Ok(())
    }
}

/// Filters are immutable after `init`, so they sit outside the mutex and a
/// filtered-out line never takes the lock.
struct Registry {
    filters: Filters,
    logger: Mutex<Logger>,
}

impl Registry {

    fn new(filters: Filters) -> Self {
        Self {
            filters,
            logger: Mutex::new(Logger::new()),
        }
    }

    #[inline(always)]
    fn lock(&self) -> Result<MutexGuard<'_, Logger>> {
        self.logger.lock().map_err(|_| LogError::Poisoned)
    }

    fn log(&self, target: &str, level: LevelFmt, msg: core::fmt::Arguments) -> Result<bool> {
        if !self.filters.enabled(target, level.level()) {
            return Ok(false)
        }
        self.lock()?.write(&level, msg)?;
        Ok(true)
    }

    fn with_fmt(
        &self,
        f: impl FnOnce(&mut Logger) -> &mut LogFmt,
        build: impl FnOnce(&mut LogFmtBuilder),
    ) -> Result<()>
    {
        let mut logger = self.lock()?;
        let mut builder = LogFmtBuilder::new(f(&mut *logger));
        build(&mut builder);
        Ok(())
    }

    fn custom_fmt(&self, fmt: LogFmt) -> Result<CustomFmt> {
        let mut logger = self.lock()?;
        let index = CustomFmt(logger.custom_fmt.len() as u32);
        logger.custom_fmt.push(fmt);
        Ok(index)
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Installs the process-wide logger, reading filters from `RUST_LOG`.
///
/// Calling this more than once is harmless; only the first call has an
/// effect.
pub fn init() {
    init_with(Filters::from_env())
}

pub fn init_with(filters: Filters) {
    let _ = REGISTRY.set(Registry::new(filters));
}

#[inline(always)]
pub fn is_initialized() -> bool {
    REGISTRY.get().is_some()
}

fn with_fmt(f: impl FnOnce(&mut Logger) -> &mut LogFmt, build: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    match REGISTRY.get() {
        Some(registry) => registry.with_fmt(f, build),
        None => Ok(()),
    }
}

#[inline(always)]
pub fn error_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    with_fmt(|logger| &mut logger.error_fmt, f)
}

#[inline(always)]
pub fn warn_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    with_fmt(|logger| &mut logger.warn_fmt, f)
}

#[inline(always)]
pub fn info_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    with_fmt(|logger| &mut logger.info_fmt, f)
}

#[inline(always)]
pub fn debug_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    with_fmt(|logger| &mut logger.debug_fmt, f)
}

#[inline(always)]
pub fn trace_fmt(f: impl FnOnce(&mut LogFmtBuilder)) -> Result<()> {
    with_fmt(|logger| &mut logger.trace_fmt, f)
}

/// Registers a format for use with [`LevelFmt::Other`].
///
/// Returns `None` if the logger has not been initialized.
pub fn custom_fmt(fmt: LogFmt) -> Result<Option<CustomFmt>> {
    REGISTRY
        .get()
        .map(|registry| registry.custom_fmt(fmt))
        .transpose()
}

/// Writes one line if `target` is enabled for `level`.
///
/// Returns `Ok(false)` when the line was filtered out or the logger was
/// never initialized.
#[inline(always)]
pub fn log(target: &str, level: LevelFmt, args: core::fmt::Arguments) -> Result<bool> {
    match REGISTRY.get() {
        Some(registry) => registry.log(target, level, args),
        None => Ok(false),
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:ident, $($arg:tt)+) => {
        $crate::log(module_path!(), $crate::LevelFmt::$level, format_args!($($arg)+))
            .unwrap_or(false)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::log_at!(Error, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => { $crate::log_at!(Warn, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::log_at!(Info, $($arg)+) };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::log_at!(Debug, $($arg)+) };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => { $crate::log_at!(Trace, $($arg)+) };
}
