use core::fmt::{Arguments, Write};

use super::console_putchar;

/// A manager that provides interface for the log system.
///
/// It's promised that the lines of different log would not interleave due to the lock around it.
/// Records below [`crate::config::LOG_LEVEL`] are dropped by the macros before the lock is taken.
///
/// A trap handler must log with the `try` form (`warnln!(try "...")`): the interrupted task may
/// hold the lock and can't run again until the handler returns, so a busy lock drops the record.
pub struct LogManager {
    lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Fatal,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name, falling back to `Info` for anything unknown.
    pub const fn parse(name: &str) -> Self {
        let name = name.as_bytes();
        if bytes_eq(name, b"fatal") || bytes_eq(name, b"error") {
            Self::Fatal
        } else if bytes_eq(name, b"warn") {
            Self::Warn
        } else if bytes_eq(name, b"debug") {
            Self::Debug
        } else if bytes_eq(name, b"trace") {
            Self::Trace
        } else {
            Self::Info
        }
    }

    pub const fn enabled(self) -> bool {
        self as u8 <= crate::config::LOG_LEVEL as u8
    }
}

const fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

impl LogManager {
    pub fn new() -> Self {
        Self { lines: 0 }
    }

    pub fn print(&mut self, level: LogLevel, args: Arguments) {
        if level.enabled() {
            // the console can't fail
            let _ = self.write_fmt(args);
            self.lines += 1;
        }
    }

    /// Number of records written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LogManager {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(console_putchar);
        Ok(())
    }
}

#[macro_export]
macro_rules! log {
    (try $level: expr, $args: expr) => {
        if $level.enabled() {
            if let Some(mut log) = $crate::io::try_log_manager() {
                log.print($level, $args)
            }
        }
    };
    ($level: expr, $args: expr) => {
        if $level.enabled() {
            $crate::io::log_manager().print($level, $args)
        }
    };
}

#[macro_export]
macro_rules! fatalln {
    (try $fmt: literal $($t: tt)*) => {
        $crate::log!(try $crate::io::log::LogLevel::Fatal, format_args!(concat!("\x1b[31m", "[FATAL] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
    ($fmt: literal $($t: tt)*) => {
        $crate::log!($crate::io::log::LogLevel::Fatal, format_args!(concat!("\x1b[31m", "[FATAL] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
}

#[macro_export]
macro_rules! warnln {
    (try $fmt: literal $($t: tt)*) => {
        $crate::log!(try $crate::io::log::LogLevel::Warn, format_args!(concat!("\x1b[93m", "[WARN] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
    ($fmt: literal $($t: tt)*) => {
        $crate::log!($crate::io::log::LogLevel::Warn, format_args!(concat!("\x1b[93m", "[WARN] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
}

#[macro_export]
macro_rules! infoln {
    (try $fmt: literal $($t: tt)*) => {
        $crate::log!(try $crate::io::log::LogLevel::Info, format_args!(concat!("\x1b[34m", "[INFO] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
    ($fmt: literal $($t: tt)*) => {
        $crate::log!($crate::io::log::LogLevel::Info, format_args!(concat!("\x1b[34m", "[INFO] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
}

#[macro_export]
macro_rules! debugln {
    (try $fmt: literal $($t: tt)*) => {
        $crate::log!(try $crate::io::log::LogLevel::Debug, format_args!(concat!("\x1b[32m", "[DEBUG] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
    ($fmt: literal $($t: tt)*) => {
        $crate::log!($crate::io::log::LogLevel::Debug, format_args!(concat!("\x1b[32m", "[DEBUG] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
}

#[macro_export]
macro_rules! traceln {
    (try $fmt: literal $($t: tt)*) => {
        $crate::log!(try $crate::io::log::LogLevel::Trace, format_args!(concat!("\x1b[90m", "[TRACE] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
    ($fmt: literal $($t: tt)*) => {
        $crate::log!($crate::io::log::LogLevel::Trace, format_args!(concat!("\x1b[90m", "[TRACE] ", $fmt, "\x1b[0m", "\n") $($t)*))
    };
}
