use crate::config::MAX_TASKS;

use super::task::{Task, TaskId};

/// Fixed pool of task control blocks.
///
/// Free slots are kept on a stack, so the slot released last is handed out first.
pub struct TaskManager {
    tasks: [Task; MAX_TASKS],
    used: [bool; MAX_TASKS],
    free: [usize; MAX_TASKS],
    free_len: usize,
}

impl TaskManager {
    pub const fn new() -> Self {
        const EMPTY: Task = Task::empty(TaskId(0));
        let mut tasks = [EMPTY; MAX_TASKS];
        let mut free = [0; MAX_TASKS];
        let mut i = 0;
        while i < MAX_TASKS {
            tasks[i] = Task::empty(TaskId(i));
            // slot 0 on top
            free[i] = MAX_TASKS - 1 - i;
            i += 1;
        }
        Self {
            tasks,
            used: [false; MAX_TASKS],
            free,
            free_len: MAX_TASKS,
        }
    }

    /// Take a free slot, reset to an empty control block.
    pub fn alloc(&mut self) -> Option<TaskId> {
        if self.free_len == 0 {
            return None;
        }
        self.free_len -= 1;
        let slot = self.free[self.free_len];
        self.used[slot] = true;
        self.tasks[slot] = Task::empty(TaskId(slot));
        Some(TaskId(slot))
    }

    /// Give a slot back to the pool.
    pub fn dealloc(&mut self, id: TaskId) {
        if !self.contains(id) {
            return;
        }
        self.used[id.0] = false;
        self.free[self.free_len] = id.0;
        self.free_len += 1;
    }

    pub fn contains(&self, id: TaskId) -> bool {
        id.0 < MAX_TASKS && self.used[id.0]
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.contains(id).then(|| &self.tasks[id.0])
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        if self.contains(id) {
            Some(&mut self.tasks[id.0])
        } else {
            None
        }
    }

    /// Number of slots in use.
    pub fn len(&self) -> usize {
        MAX_TASKS - self.free_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .zip(self.used.iter())
            .filter_map(|(task, &used)| used.then_some(task))
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
