use core::fmt;

use crate::config::TASK_NAME_LEN;

use super::context::TaskContext;

/// A task body. It receives the parameter given to `task_init` and must never return.
pub type TaskEntry = extern "C" fn(usize);

/// Index of a task control block in the scheduler's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, never started.
    Init,
    /// Off the ready queue until resumed.
    Suspend,
    /// Waiting in the ready queue.
    Ready,
    /// Owns the cpu.
    Running,
}

/// A bounded task name, truncated on a character boundary.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TaskName {
    bytes: [u8; TASK_NAME_LEN],
    len: usize,
}

impl TaskName {
    pub const fn empty() -> Self {
        Self {
            bytes: [0; TASK_NAME_LEN],
            len: 0,
        }
    }

    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(TASK_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0; TASK_NAME_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { bytes, len }
    }

    pub fn as_str(&self) -> &str {
        // only ever filled from a `&str` cut at a boundary
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Task control block.
pub struct Task {
    id: TaskId,
    name: TaskName,
    entry: Option<TaskEntry>,
    parameter: usize,
    /// Lowest address of the stack, allocated from the kernel heap.
    stack_base: usize,
    stack_size: usize,
    ctx: TaskContext,
    state: TaskState,
    /// Recorded, but the ready queue is plain FIFO.
    priority: u8,
}

impl Task {
    pub const fn empty(id: TaskId) -> Self {
        Self {
            id,
            name: TaskName::empty(),
            entry: None,
            parameter: 0,
            stack_base: 0,
            stack_size: 0,
            ctx: TaskContext::empty(),
            state: TaskState::Init,
            priority: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TaskId,
        name: &str,
        entry: TaskEntry,
        parameter: usize,
        stack_base: usize,
        stack_size: usize,
        ctx: TaskContext,
        priority: u8,
    ) -> Self {
        Self {
            id,
            name: TaskName::new(name),
            entry: Some(entry),
            parameter,
            stack_base,
            stack_size,
            ctx,
            state: TaskState::Init,
            priority,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    pub fn entry(&self) -> Option<TaskEntry> {
        self.entry
    }

    pub fn parameter(&self) -> usize {
        self.parameter
    }

    /// `(base, size)` of the task's stack.
    pub fn stack(&self) -> (usize, usize) {
        (self.stack_base, self.stack_size)
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn ctx(&self) -> &TaskContext {
        &self.ctx
    }

    pub fn ctx_ptr(&mut self) -> *mut TaskContext {
        &mut self.ctx
    }
}
