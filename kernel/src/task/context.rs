/// Stack pointers handed to a fresh task are rounded down to this.
pub const STACK_ALIGN: usize = 16;

/// Callee-saved state of a suspended task.
///
/// `ra` is where the task resumes when switched back in. A fresh task resumes at the entry
/// trampoline with its entry function in `s0` (`sr[0]`) and its parameter in `s1` (`sr[1]`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskContext {
    pub ra: usize,
    pub sp: usize,
    pub sr: [usize; 12],
}

impl TaskContext {
    pub const fn empty() -> Self {
        Self {
            ra: 0,
            sp: 0,
            sr: [0; 12],
        }
    }

    pub const fn new(ra: usize, sp: usize) -> Self {
        Self {
            ra,
            sp,
            sr: [0; 12],
        }
    }

    /// Build the context a task starts from: the first switch into it lands on `trampoline`,
    /// which calls `entry(parameter)` on the stack ending at `stack_top`.
    pub const fn with_entry(
        trampoline: usize,
        stack_top: usize,
        entry: usize,
        parameter: usize,
    ) -> Self {
        let mut ctx = Self::new(trampoline, stack_top & !(STACK_ALIGN - 1));
        ctx.sr[0] = entry;
        ctx.sr[1] = parameter;
        ctx
    }

    pub fn entry(&self) -> usize {
        self.sr[0]
    }

    pub fn parameter(&self) -> usize {
        self.sr[1]
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// The machine-dependent half of the scheduler.
///
/// # Safety
///
/// `switch` saves the running context into `curr` and resumes `next`. It returns only when some
/// later switch resumes `curr`. Both pointers must stay valid for as long as either context lives.
pub trait ContextSwitch {
    /// Address a fresh context starts executing at.
    fn trampoline(&self) -> usize;

    unsafe fn switch(&self, curr: *mut TaskContext, next: *const TaskContext);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_carries_entry_and_parameter() {
        let ctx = TaskContext::with_entry(0x8000_1000, 0x8020_0ffc, 0x8000_2000, 42);
        assert_eq!(ctx.ra, 0x8000_1000);
        assert_eq!(ctx.sp, 0x8020_0ff0);
        assert_eq!(ctx.entry(), 0x8000_2000);
        assert_eq!(ctx.parameter(), 42);
        assert!(ctx.sr[2..].iter().all(|&r| r == 0));
    }
}
