//! Small category based logger.
//!
//! Messages go through the `log_*!` macros, which do nothing until a [`Logger`] is installed with [`set_logger`].
//! Output is buffered and written to the console and up to [`Logger::MAX_WRITERS`] extra writers.

use core::{
    fmt::{self, Arguments, Display},
    sync::atomic::{AtomicU8, Ordering},
};
use std::{
    fmt::Write as _,
    io::{self, Write},
};
use parking_lot::{Mutex, RwLock, const_mutex, const_rwlock};

static GLOBAL_LOGGER : RwLock<Option<&'static Logger>> = const_rwlock(None);

/// Install the logger used by the `log_*!` macros, returning the previously installed one.
pub fn set_logger(logger: &'static Logger) -> Option<&'static Logger> {
    GLOBAL_LOGGER.write().replace(logger)
}

/// Get the installed logger.
///
/// # Panics
///
/// Panics if [`set_logger`] was never called.
pub fn get_logger() -> &'static Logger {
    match try_get_logger() {
        Some(logger) => logger,
        None => panic!("no logger installed, call `set_logger` first"),
    }
}

pub fn try_get_logger() -> Option<&'static Logger> {
    *GLOBAL_LOGGER.read()
}

/// Severity of a message, ordered from most to least severe.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    /// The program is unlikely to keep running correctly.
    Severe,
    Error,
    Warning,
    Info,
    /// Bookkeeping detail, like allocations.
    Verbose,
    Debug,
}

impl LogLevel {
    const fn label(self) -> &'static str {
        match self {
            LogLevel::Severe  => "SEVERE ",
            LogLevel::Error   => "ERROR  ",
            LogLevel::Warning => "WARNING",
            LogLevel::Info    => "INFO   ",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug   => "DEBUG  ",
        }
    }

    const fn ansi_color(self) -> &'static str {
        match self {
            LogLevel::Severe  => "\x1B[1m\x1B[41m\x1B[30m",
            LogLevel::Error   => "\x1B[91m",
            LogLevel::Warning => "\x1B[93m",
            LogLevel::Info    => "\x1B[37m",
            LogLevel::Verbose => "\x1B[90m",
            LogLevel::Debug   => "\x1B[94m",
        }
    }

    /// Messages at these levels also print the source location.
    const fn shows_location(self) -> bool {
        matches!(self, LogLevel::Severe | LogLevel::Error | LogLevel::Debug)
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]\x1B[0m", self.ansi_color(), self.label())
    }
}

/// Name a message is grouped under, optionally narrowed down by a sub-category.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LogCategory {
    name : &'static str,
    sub  : Option<&'static str>,
}

impl LogCategory {
    pub const fn new(name: &'static str) -> Self {
        Self { name, sub: None }
    }

    pub const fn new_with_sub(name: &'static str, sub: &'static str) -> Self {
        Self { name, sub: Some(sub) }
    }
}

impl Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}({sub})", self.name),
            None => f.write_str(self.name),
        }
    }
}

/// Source location of a log call, see [`log_location!`].
#[derive(Clone, Copy, Debug)]
pub struct LogLocation {
    file   : &'static str,
    line   : u32,
    module : &'static str,
}

impl LogLocation {
    pub const fn new(file: &'static str, line: u32, module: &'static str) -> Self {
        Self { file, line, module }
    }

    pub const fn file(&self) -> &'static str {
        self.file
    }

    pub const fn line(&self) -> u32 {
        self.line
    }

    pub const fn module(&self) -> &'static str {
        self.module
    }
}

impl Display for LogLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{}: {})", self.file, self.line, self.module)
    }
}

/// Expands to the [`LogLocation`] of the macro call.
#[macro_export]
macro_rules! log_location {
    () => {
        $crate::LogLocation::new(file!(), line!(), module_path!())
    };
}

pub type LogWriter = Box<dyn Write + Send>;

/// Everything behind the logger's mutex.
struct Sinks {
    writers            : [Option<LogWriter>; Logger::MAX_WRITERS],
    pending            : String,
    flush_each_message : bool,
    console            : bool,
}

impl Sinks {
    const NO_WRITER: Option<LogWriter> = None;
    const PENDING_LIMIT: usize = 4 * 1024;

    const fn new() -> Self {
        Self {
            writers: [Self::NO_WRITER; Logger::MAX_WRITERS],
            pending: String::new(),
            flush_each_message: false,
            console: true,
        }
    }

    fn push(&mut self, category: LogCategory, level: LogLevel, loc: &LogLocation, message: Arguments) {
        // Writing into a `String` can't fail
        _ = if level.shows_location() {
            write!(self.pending, "{level} [{category}] {loc}: ")
        } else {
            write!(self.pending, "{level} [{category}] : ")
        };
        _ = self.pending.write_fmt(message);
        self.pending.push('\n');

        if self.flush_each_message || self.pending.len() > Self::PENDING_LIMIT {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let bytes = self.pending.as_bytes();
        if self.console {
            let mut stdout = io::stdout().lock();
            _ = stdout.write_all(bytes).and_then(|_| stdout.flush());
        }
        for writer in self.writers.iter_mut().flatten() {
            _ = writer.write_all(bytes).and_then(|_| writer.flush());
        }
        self.pending.clear();
    }
}

/// Buffered logger writing to the console and a fixed number of additional writers.
///
/// Messages above the maximum level are discarded before they are formatted.
pub struct Logger {
    sinks     : Mutex<Sinks>,
    max_level : AtomicU8,
}

impl Logger {
    pub const MAX_WRITERS: usize = 8;

    /// Create a logger that logs up to [`LogLevel::Info`] to the console.
    pub const fn new() -> Self {
        Self {
            sinks: const_mutex(Sinks::new()),
            max_level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    pub fn set_max_level(&self, level: LogLevel) {
        self.max_level.store(level as u8, Ordering::Relaxed)
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.max_level.load(Ordering::Relaxed)
    }

    /// Write every message out immediately, instead of batching them.
    pub fn set_always_flush(&self, always_flush: bool) {
        self.sinks.lock().flush_each_message = always_flush;
    }

    pub fn set_log_to_console(&self, log_to_console: bool) {
        let mut sinks = self.sinks.lock();
        // Pending messages still go where they were meant to go
        sinks.flush();
        sinks.console = log_to_console;
    }

    /// Add a writer, returning the slot it was put in, or the writer itself when all slots are taken.
    pub fn add_writer(&self, writer: LogWriter) -> Result<usize, LogWriter> {
        let mut sinks = self.sinks.lock();
        match sinks.writers.iter().position(Option::is_none) {
            Some(slot) => {
                sinks.writers[slot] = Some(writer);
                Ok(slot)
            },
            None => Err(writer),
        }
    }

    /// Take the writer out of `slot`, after flushing the pending messages to it.
    pub fn remove_writer(&self, slot: usize) -> Option<LogWriter> {
        let mut sinks = self.sinks.lock();
        sinks.flush();
        sinks.writers.get_mut(slot)?.take()
    }

    pub fn log(&self, category: LogCategory, level: LogLevel, loc: LogLocation, text: &str) {
        self.log_fmt(category, level, loc, format_args!("{text}"));
    }

    pub fn log_fmt(&self, category: LogCategory, level: LogLevel, loc: LogLocation, message: Arguments) {
        if self.is_enabled(level) {
            self.sinks.lock().push(category, level, &loc, message);
        }
    }

    pub fn flush(&self) {
        self.sinks.lock().flush()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sinks.get_mut().flush();
    }
}

/// Log a formatted message at the given level, when a logger is installed.
#[macro_export]
macro_rules! log {
    ($category:expr, $level:expr, $($arg:tt)+) => {
        if let Some(logger) = $crate::try_get_logger() {
            logger.log_fmt($category, $level, $crate::log_location!(), format_args!($($arg)+));
        }
    };
}

#[macro_export]
macro_rules! log_severe {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Severe, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_verbose {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Verbose, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($category:expr, $($arg:tt)+) => { $crate::log!($category, $crate::LogLevel::Debug, $($arg)+) };
}
