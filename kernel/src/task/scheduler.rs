use allocator::LockedHeap;
use spin::Spin;

use crate::config::MAX_TASKS;

use super::{
    context::{ContextSwitch, TaskContext},
    list::IndexList,
    manager::TaskManager,
    task::{Task, TaskEntry, TaskId, TaskName, TaskState},
    TaskError,
};

struct SchedulerInner {
    manager: TaskManager,
    ready: IndexList<MAX_TASKS>,
    /// The task the last dispatch switched to, until control comes back to the scheduler.
    current: Option<TaskId>,
    /// Where the scheduler loop itself is parked while a task runs.
    idle_ctx: TaskContext,
    dispatches: usize,
}

impl SchedulerInner {
    const fn new() -> Self {
        Self {
            manager: TaskManager::new(),
            ready: IndexList::new(),
            current: None,
            idle_ctx: TaskContext::empty(),
            dispatches: 0,
        }
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskError> {
        self.manager.get_mut(id).ok_or(TaskError::NoSuchTask)
    }

    /// Move `id` to the tail of the ready queue.
    fn enqueue(&mut self, id: TaskId) {
        self.ready.remove(id.0);
        self.ready.push_back(id.0);
    }
}

/// A cooperative round-robin scheduler over a fixed pool of tasks.
///
/// Tasks run until they call [`Scheduler::task_yield`] (or get [`Scheduler::preempt`]ed), which
/// switches back to the scheduler loop parked in `idle_ctx`. Every dispatch takes the head of the
/// ready queue. Stacks come from `heap` and are never returned, since tasks never exit.
pub struct Scheduler<'h, S: ContextSwitch> {
    inner: Spin<SchedulerInner>,
    heap: &'h LockedHeap,
    switch: S,
}

impl<'h, S: ContextSwitch> Scheduler<'h, S> {
    pub const fn new(heap: &'h LockedHeap, switch: S) -> Self {
        Self {
            inner: Spin::new(SchedulerInner::new()),
            heap,
            switch,
        }
    }

    /// Forget every task and empty the ready queue.
    pub fn init(&self) {
        *self.inner.lock() = SchedulerInner::new();
        infoln!("[scheduler] Initialized with {} task slots.", MAX_TASKS);
    }

    /// Create a task in `Init` state with a zeroed stack of `stack_size` bytes.
    ///
    /// The task doesn't run before [`Scheduler::task_startup`]. Its slot is given back if the
    /// stack can't be allocated.
    pub fn task_init(
        &self,
        name: &str,
        entry: TaskEntry,
        parameter: usize,
        stack_size: usize,
        priority: u8,
    ) -> Result<TaskId, TaskError> {
        let id = self
            .inner
            .lock()
            .manager
            .alloc()
            .ok_or(TaskError::PoolExhausted)?;

        let stack = match self.heap.alloc(stack_size) {
            Ok(stack) => stack,
            Err(err) => {
                self.inner.lock().manager.dealloc(id);
                warnln!("[scheduler] No stack for task {}: {}.", name, err);
                return Err(TaskError::NoMemory);
            }
        };
        unsafe {
            stack.as_ptr().write_bytes(0, stack_size);
        }

        let stack_base = stack.as_ptr() as usize;
        let ctx = TaskContext::with_entry(
            self.switch.trampoline(),
            stack_base + stack_size,
            entry as usize,
            parameter,
        );
        let task = Task::new(id, name, entry, parameter, stack_base, stack_size, ctx, priority);

        let mut inner = self.inner.lock();
        inner.ready.remove(id.0);
        *inner.task_mut(id)? = task;
        drop(inner);

        debugln!(
            "[scheduler] Task {} ({}) created, stack {:#x}..{:#x}.",
            id,
            name,
            stack_base,
            stack_base + stack_size
        );
        Ok(id)
    }

    /// Make a freshly created task runnable.
    pub fn task_startup(&self, id: TaskId) -> Result<(), TaskError> {
        {
            let mut inner = self.inner.lock();
            let task = inner.task_mut(id)?;
            match task.state() {
                TaskState::Init | TaskState::Suspend => task.set_state(TaskState::Suspend),
                state => {
                    warnln!("[scheduler] Task {} can't start up from {:?}.", id, state);
                    return Err(TaskError::InvalidState);
                }
            }
        }
        self.task_resume(id)
    }

    /// Put a suspended task at the tail of the ready queue.
    pub fn task_resume(&self, id: TaskId) -> Result<(), TaskError> {
        let mut inner = self.inner.lock();
        let task = inner.task_mut(id)?;
        if task.state() != TaskState::Suspend {
            warnln!(
                "[scheduler] Task {} is {:?}, only suspended tasks resume.",
                id,
                task.state()
            );
            return Err(TaskError::InvalidState);
        }
        task.set_state(TaskState::Ready);
        inner.enqueue(id);
        Ok(())
    }

    /// Take a ready task off the queue until it is resumed.
    pub fn task_suspend(&self, id: TaskId) -> Result<(), TaskError> {
        let mut inner = self.inner.lock();
        let task = inner.task_mut(id)?;
        if task.state() != TaskState::Ready {
            return Err(TaskError::InvalidState);
        }
        task.set_state(TaskState::Suspend);
        inner.ready.remove(id.0);
        Ok(())
    }

    /// Give up the cpu, going to the tail of the ready queue.
    ///
    /// Does nothing outside a task.
    pub fn task_yield(&self) {
        let (curr, idle) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let Some(id) = inner.current else {
                return;
            };
            let Some(task) = inner.manager.get_mut(id) else {
                return;
            };
            let running = task.state() == TaskState::Running;
            if running {
                task.set_state(TaskState::Ready);
            }
            let curr = task.ctx_ptr();
            if running {
                inner.enqueue(id);
            }
            (curr, &inner.idle_ctx as *const TaskContext)
        };
        unsafe { self.switch.switch(curr, idle) }
    }

    /// Switch from the running task back to the scheduler loop, which puts it at the tail of
    /// the ready queue.
    ///
    /// Meant for the timer interrupt. Skipped when the scheduler is busy or no task runs.
    pub fn preempt(&self) {
        let (id, curr, idle) = {
            let Some(mut guard) = self.inner.try_lock() else {
                return;
            };
            let inner = &mut *guard;
            let Some(id) = inner.current else {
                return;
            };
            match inner.manager.get_mut(id) {
                Some(task) if task.state() == TaskState::Running => {
                    (id, task.ctx_ptr(), &inner.idle_ctx as *const TaskContext)
                }
                _ => return,
            }
        };
        traceln!(try "[scheduler] Preempt task {}.", id);
        unsafe { self.switch.switch(curr, idle) }
    }

    /// Run the head of the ready queue until it gives the cpu back, and return its id.
    ///
    /// A task that comes back still running (it was preempted) is queued again at the tail.
    ///
    /// # Panics
    ///
    /// Panics if no task is ready.
    pub fn dispatch(&self) -> TaskId {
        let (id, idle, next) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let Some(slot) = inner.ready.pop_front() else {
                panic!("[scheduler] The ready queue is empty.");
            };
            let id = TaskId(slot);
            inner.current = Some(id);
            inner.dispatches += 1;
            let idle = &mut inner.idle_ctx as *mut TaskContext;
            let Some(task) = inner.manager.get_mut(id) else {
                panic!("[scheduler] Task {} is queued but not allocated.", id);
            };
            task.set_state(TaskState::Running);
            (id, idle, task.ctx() as *const TaskContext)
        };

        traceln!("[scheduler] Switch to task {}.", id);
        unsafe { self.switch.switch(idle, next) };

        let mut inner = self.inner.lock();
        if let Some(prev) = inner.current.take() {
            if let Some(task) = inner.manager.get_mut(prev) {
                if task.state() == TaskState::Running {
                    task.set_state(TaskState::Ready);
                    inner.enqueue(prev);
                }
            }
        }
        id
    }

    /// The scheduler loop. Never returns.
    pub fn schedule(&self) -> ! {
        infoln!(
            "[scheduler] Start scheduling {} ready tasks.",
            self.inner.lock().ready.len()
        );
        loop {
            self.dispatch();
        }
    }

    pub fn current(&self) -> Option<TaskId> {
        self.inner.lock().current
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.inner.lock().manager.get(id).map(Task::state)
    }

    pub fn name(&self, id: TaskId) -> Option<TaskName> {
        self.inner.lock().manager.get(id).map(|task| *task.name())
    }

    pub fn priority(&self, id: TaskId) -> Option<u8> {
        self.inner.lock().manager.get(id).map(Task::priority)
    }

    /// `(base, size)` of the task's stack.
    pub fn stack(&self, id: TaskId) -> Option<(usize, usize)> {
        self.inner.lock().manager.get(id).map(Task::stack)
    }

    pub fn task_count(&self) -> usize {
        self.inner.lock().manager.len()
    }

    pub fn ready_len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    /// Visit the ready queue from head to tail, holding the scheduler lock.
    pub fn for_each_ready(&self, mut f: impl FnMut(TaskId)) {
        self.inner.lock().ready.iter().for_each(|slot| f(TaskId(slot)));
    }

    /// Number of switches into tasks so far.
    pub fn dispatches(&self) -> usize {
        self.inner.lock().dispatches
    }
}

#[cfg(test)]
mod tests {
    use core::cell::UnsafeCell;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use spin::SpinLock;

    use super::*;
    use crate::task::hosted::HostedSwitch;

    type TestScheduler = Scheduler<'static, HostedSwitch>;

    const STACK: usize = 0x400;

    fn scheduler(heap_bytes: usize) -> &'static TestScheduler {
        let words = vec![0u64; heap_bytes / 8].leak();
        let start = words.as_mut_ptr() as usize;
        let heap: &'static LockedHeap = Box::leak(Box::new(LockedHeap::empty()));
        unsafe { heap.init(start, start + heap_bytes).unwrap() };
        Box::leak(Box::new(Scheduler::new(heap, HostedSwitch::new())))
    }

    fn ready(sched: &TestScheduler) -> Vec<TaskId> {
        let mut ids = Vec::new();
        sched.for_each_ready(|id| ids.push(id));
        ids
    }

    /// Handed to a task through its parameter.
    struct Shared {
        sched: &'static TestScheduler,
        lock: SpinLock,
        counter: UnsafeCell<usize>,
        done: AtomicUsize,
        trace: Mutex<Vec<usize>>,
    }

    fn shared(sched: &'static TestScheduler) -> &'static Shared {
        Box::leak(Box::new(Shared {
            sched,
            lock: SpinLock::new(),
            counter: UnsafeCell::new(0),
            done: AtomicUsize::new(0),
            trace: Mutex::new(Vec::new()),
        }))
    }

    fn param(shared: &'static Shared) -> usize {
        shared as *const Shared as usize
    }

    fn unpack(param: usize) -> &'static Shared {
        unsafe { &*(param as *const Shared) }
    }

    extern "C" fn yielder(param: usize) {
        let shared = unpack(param);
        loop {
            shared.sched.task_yield();
        }
    }

    extern "C" fn preempted(param: usize) {
        let shared = unpack(param);
        loop {
            shared.sched.preempt();
        }
    }

    extern "C" fn noop(_: usize) {}

    const ROUNDS: usize = 1000;

    /// Read, yield, write back: lost updates show up unless the lock is held throughout.
    extern "C" fn increment(param: usize) {
        let shared = unpack(param);
        for _ in 0..ROUNDS {
            while !shared.lock.try_acquire() {
                shared.sched.task_yield();
            }
            let value = unsafe { *shared.counter.get() };
            shared.sched.task_yield();
            unsafe { *shared.counter.get() = value + 1 };
            shared.lock.release();
            shared.sched.task_yield();
        }
        shared.done.fetch_add(1, Ordering::SeqCst);
        loop {
            shared.sched.task_yield();
        }
    }

    extern "C" fn record(param: usize) {
        let shared = unpack(param);
        loop {
            let id = shared.sched.current().map(|id| id.0).unwrap_or(usize::MAX);
            shared.trace.lock().unwrap().push(id);
            shared.sched.task_yield();
        }
    }

    /// Each turn, try to resume itself and record 1 if that was refused without touching the
    /// ready queue.
    extern "C" fn resume_self(param: usize) {
        let shared = unpack(param);
        let sched = shared.sched;
        loop {
            let refused = match sched.current() {
                Some(me) => {
                    let queue = ready(sched);
                    sched.task_resume(me) == Err(TaskError::InvalidState)
                        && ready(sched) == queue
                        && sched.ready_len() == queue.len()
                        && sched.state(me) == Some(TaskState::Running)
                }
                None => false,
            };
            shared.trace.lock().unwrap().push(refused as usize);
            sched.task_yield();
        }
    }

    fn spawn(sched: &TestScheduler, name: &str, entry: TaskEntry, param: usize) -> TaskId {
        let id = sched.task_init(name, entry, param, STACK, 1).unwrap();
        sched.task_startup(id).unwrap();
        id
    }

    #[test]
    fn task_init_leaves_task_off_the_queue() {
        let sched = scheduler(0x4000);
        let id = sched.task_init("worker", noop, 7, STACK, 3).unwrap();
        assert_eq!(id, TaskId(0));
        assert_eq!(sched.state(id), Some(TaskState::Init));
        assert_eq!(sched.name(id).unwrap().as_str(), "worker");
        assert_eq!(sched.priority(id), Some(3));
        assert_eq!(sched.ready_len(), 0);
        assert_eq!(sched.task_count(), 1);
        let (base, size) = sched.stack(id).unwrap();
        assert_eq!(size, STACK);
        assert_eq!(base % 8, 0);
    }

    #[test]
    fn stack_is_zeroed() {
        let sched = scheduler(0x4000);
        let dirty = sched.heap.alloc(STACK).unwrap();
        unsafe {
            dirty.as_ptr().write_bytes(0xaa, STACK);
            sched.heap.free(dirty.as_ptr());
        }
        let id = sched.task_init("clean", noop, 0, STACK, 0).unwrap();
        let (base, size) = sched.stack(id).unwrap();
        assert_eq!(base, dirty.as_ptr() as usize);
        let stack = unsafe { core::slice::from_raw_parts(base as *const u8, size) };
        assert!(stack.iter().all(|&b| b == 0));
    }

    #[test]
    fn names_are_truncated() {
        let sched = scheduler(0x4000);
        let id = sched
            .task_init("a-very-long-task-name", noop, 0, STACK, 0)
            .unwrap();
        assert_eq!(
            sched.name(id).unwrap().as_str(),
            &"a-very-long-task-name"[..crate::config::TASK_NAME_LEN]
        );
    }

    #[test]
    fn no_memory_gives_the_slot_back() {
        let sched = scheduler(0x1000);
        assert_eq!(
            sched.task_init("huge", noop, 0, 0x2000, 0),
            Err(TaskError::NoMemory)
        );
        assert_eq!(sched.task_init("empty", noop, 0, 0, 0), Err(TaskError::NoMemory));
        assert_eq!(sched.task_count(), 0);
        assert_eq!(sched.task_init("small", noop, 0, 0x100, 0), Ok(TaskId(0)));
    }

    #[test]
    fn pool_exhaustion() {
        let sched = scheduler(0x4000);
        for i in 0..MAX_TASKS {
            assert_eq!(sched.task_init("t", noop, 0, 64, 0), Ok(TaskId(i)));
        }
        assert_eq!(
            sched.task_init("t", noop, 0, 64, 0),
            Err(TaskError::PoolExhausted)
        );
    }

    #[test]
    fn startup_appends_in_order() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", yielder, param(s));
        let b = spawn(sched, "b", yielder, param(s));
        assert_eq!(ready(sched), [a, b]);
        assert_eq!(sched.state(a), Some(TaskState::Ready));
        assert_eq!(sched.task_startup(a), Err(TaskError::InvalidState));
        assert_eq!(sched.task_startup(TaskId(9)), Err(TaskError::NoSuchTask));
    }

    #[test]
    fn resume_needs_a_suspended_task() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", yielder, param(s));
        let b = spawn(sched, "b", yielder, param(s));
        let c = sched.task_init("c", yielder, param(s), STACK, 0).unwrap();

        assert_eq!(sched.task_resume(a), Err(TaskError::InvalidState));
        assert_eq!(sched.task_resume(c), Err(TaskError::InvalidState));
        assert_eq!(sched.task_resume(TaskId(MAX_TASKS)), Err(TaskError::NoSuchTask));
        assert_eq!(ready(sched), [a, b]);
        assert_eq!(sched.state(c), Some(TaskState::Init));
    }

    #[test]
    fn resuming_the_running_task_is_refused() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", resume_self, param(s));
        let b = spawn(sched, "b", resume_self, param(s));
        let order: Vec<_> = (0..4).map(|_| sched.dispatch()).collect();
        assert_eq!(order, [a, b, a, b]);
        assert_eq!(*s.trace.lock().unwrap(), [1, 1, 1, 1]);
        assert_eq!(ready(sched), [a, b]);
    }

    #[test]
    fn suspend_and_resume_move_to_tail() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", yielder, param(s));
        let b = spawn(sched, "b", yielder, param(s));

        sched.task_suspend(a).unwrap();
        assert_eq!(sched.state(a), Some(TaskState::Suspend));
        assert_eq!(ready(sched), [b]);
        assert_eq!(sched.task_suspend(a), Err(TaskError::InvalidState));

        sched.task_resume(a).unwrap();
        assert_eq!(ready(sched), [b, a]);
        assert_eq!(sched.dispatch(), b);
    }

    #[test]
    fn yield_outside_a_task_returns() {
        let sched = scheduler(0x4000);
        sched.task_yield();
        sched.preempt();
        assert_eq!(sched.current(), None);
    }

    #[test]
    #[should_panic(expected = "ready queue is empty")]
    fn dispatch_with_nothing_ready_panics() {
        let sched = scheduler(0x4000);
        sched.dispatch();
    }

    #[test]
    fn round_robin() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| spawn(sched, name, yielder, param(s)))
            .collect();

        let order: Vec<_> = (0..2 * ids.len()).map(|_| sched.dispatch()).collect();
        assert_eq!(order, [ids.clone(), ids.clone()].concat());
        assert_eq!(sched.dispatches(), 6);
        assert_eq!(sched.current(), None);
        assert_eq!(ready(sched), ids);
        assert!(ids.iter().all(|&id| sched.state(id) == Some(TaskState::Ready)));
    }

    #[test]
    fn tasks_see_themselves_as_current() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", record, param(s));
        let b = spawn(sched, "b", record, param(s));
        for _ in 0..4 {
            sched.dispatch();
        }
        assert_eq!(*s.trace.lock().unwrap(), [a.0, b.0, a.0, b.0]);
    }

    #[test]
    fn single_task_keeps_running() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "solo", yielder, param(s));
        for _ in 0..3 {
            assert_eq!(sched.dispatch(), a);
        }
    }

    #[test]
    fn preempted_task_goes_to_tail() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        let a = spawn(sched, "a", preempted, param(s));
        let b = spawn(sched, "b", preempted, param(s));
        let order: Vec<_> = (0..4).map(|_| sched.dispatch()).collect();
        assert_eq!(order, [a, b, a, b]);
        assert_eq!(sched.state(a), Some(TaskState::Ready));
    }

    #[test]
    fn spin_lock_keeps_increments() {
        let sched = scheduler(0x4000);
        let s = shared(sched);
        for name in ["inc0", "inc1", "inc2"] {
            spawn(sched, name, increment, param(s));
        }
        while s.done.load(Ordering::SeqCst) < 3 {
            sched.dispatch();
        }
        assert_eq!(unsafe { *s.counter.get() }, 3 * ROUNDS);
        assert!(!s.lock.is_locked());
    }
}
