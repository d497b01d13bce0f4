use core::fmt;

pub mod context;
pub mod list;
pub mod manager;
pub mod scheduler;
pub mod task;

#[cfg(test)]
pub mod hosted;
#[cfg(bare_metal)]
pub mod switch;

pub use context::{ContextSwitch, TaskContext};
pub use scheduler::Scheduler;
pub use task::{TaskEntry, TaskId, TaskName, TaskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The kernel heap couldn't provide the stack.
    NoMemory,
    /// The operation doesn't apply to the task's current state.
    InvalidState,
    /// Every task control block is in use.
    PoolExhausted,
    /// The id doesn't name a task.
    NoSuchTask,
}

impl TaskError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMemory => "out of memory for the task stack",
            Self::InvalidState => "invalid task state",
            Self::PoolExhausted => "task pool exhausted",
            Self::NoSuchTask => "no such task",
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(bare_metal)]
pub static SCHEDULER: Scheduler<'static, switch::RiscvSwitch> =
    Scheduler::new(&crate::heap::KERNEL_HEAP, switch::RiscvSwitch);

/// Give up the cpu from the running task.
#[cfg(bare_metal)]
pub fn task_yield() {
    SCHEDULER.task_yield();
}
