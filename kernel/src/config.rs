use crate::io::log::LogLevel;

pub const VIRT_TEST: usize = 0x10_0000;
pub const VIRT_UART: usize = 0x1000_0000;
pub const CLINT: usize = 0x200_0000;

/// Number of task control blocks in the pool.
pub const MAX_TASKS: usize = 64;
/// Names longer than this are truncated.
pub const TASK_NAME_LEN: usize = 16;
pub const DEFAULT_STACK_SIZE: usize = 0x2000;

/// Cycles of `mtime` between two timer interrupts, 1 second on QEMU virt.
pub const SYSTEM_TICK: usize = 10_000_000;

/// Set by `LOG=fatal|warn|info|debug|trace` when building.
pub const LOG_LEVEL: LogLevel = match option_env!("LOG") {
    Some(level) => LogLevel::parse(level),
    None => LogLevel::Info,
};
