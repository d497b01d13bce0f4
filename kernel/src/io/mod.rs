#[macro_use]
pub mod stdout;
#[macro_use]
pub mod log;

use lazy_static::lazy_static;
use spin::{Spin, SpinGuard};

use log::LogManager;
use stdout::Stdout;

lazy_static! {
    static ref LOG_MANAGER: Spin<LogManager> = Spin::new(LogManager::new());
}

pub fn stdout() -> Stdout {
    Stdout
}

pub fn log_manager() -> SpinGuard<'static, LogManager> {
    LOG_MANAGER.lock()
}

/// `None` while someone else is writing a record.
pub fn try_log_manager() -> Option<SpinGuard<'static, LogManager>> {
    LOG_MANAGER.try_lock()
}

/// Put one byte on the console.
#[cfg(bare_metal)]
pub fn console_putchar(c: u8) {
    crate::drivers::uart::UART.send(c);
}

/// Hosted builds have no console device, the bytes are dropped.
#[cfg(not(bare_metal))]
pub fn console_putchar(_c: u8) {}
