//! Context switching for unit tests on the host.
//!
//! Every context is backed by an OS thread, and a baton decides which one may run. A switch
//! hands the baton to `next` and blocks until some later switch hands it back to `curr`.
//! Contexts are told apart by the address of their [`TaskContext`].

use std::{
    collections::HashSet,
    sync::{Arc, Condvar, Mutex},
    thread,
};

use super::{
    context::{ContextSwitch, TaskContext},
    task::TaskEntry,
};

#[derive(Default)]
struct Baton {
    running: usize,
    started: HashSet<usize>,
}

#[derive(Clone, Default)]
pub struct HostedSwitch {
    baton: Arc<(Mutex<Baton>, Condvar)>,
}

impl HostedSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    fn wait_turn(&self, ctx: usize) {
        let (lock, turn) = &*self.baton;
        let mut baton = lock.lock().unwrap();
        while baton.running != ctx {
            baton = turn.wait(baton).unwrap();
        }
    }

    fn spawn(&self, ctx: usize, entry: usize, parameter: usize) {
        let switch = self.clone();
        thread::spawn(move || {
            switch.wait_turn(ctx);
            let entry: TaskEntry = unsafe { core::mem::transmute(entry) };
            entry(parameter);
            panic!("task {:#x} returned from its entry", ctx);
        });
    }
}

impl ContextSwitch for HostedSwitch {
    fn trampoline(&self) -> usize {
        0
    }

    unsafe fn switch(&self, curr: *mut TaskContext, next: *const TaskContext) {
        let (curr_key, next_key) = (curr as usize, next as usize);
        {
            let (lock, turn) = &*self.baton;
            let mut baton = lock.lock().unwrap();
            baton.started.insert(curr_key);
            if baton.started.insert(next_key) {
                let next = &*next;
                self.spawn(next_key, next.entry(), next.parameter());
            }
            baton.running = next_key;
            turn.notify_all();
        }
        self.wait_turn(curr_key);
    }
}
