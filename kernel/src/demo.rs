use core::{
    ptr::addr_of_mut,
    sync::atomic::{AtomicUsize, Ordering},
};

use rvos::{
    config::DEFAULT_STACK_SIZE,
    heap::{heap_stats, kalloc, kfree},
    task::{task_yield, TaskEntry, SCHEDULER},
    time::{ticks, Pacer, Uptime},
};
use spin::SpinLock;

const ROUNDS: usize = 1000;
const WORKERS: usize = 3;

static COUNTER_LOCK: SpinLock = SpinLock::new();
static mut COUNTER: usize = 0;
static FINISHED: AtomicUsize = AtomicUsize::new(0);

/// Check the heap, then create and start the demo tasks.
pub fn load() {
    heap_self_test();

    spawn("chatter0", chatter, 0);
    spawn("chatter1", chatter, 1);
    for i in 0..WORKERS {
        spawn("counter", counter, i);
    }
    spawn("monitor", monitor, WORKERS);
}

fn spawn(name: &str, entry: TaskEntry, parameter: usize) {
    let id = match SCHEDULER.task_init(name, entry, parameter, DEFAULT_STACK_SIZE, 1) {
        Ok(id) => id,
        Err(err) => panic!("[demo] Can't create {}: {}.", name, err),
    };
    if let Err(err) = SCHEDULER.task_startup(id) {
        panic!("[demo] Can't start {}: {}.", name, err);
    }
}

/// Three blocks, free the middle one, and a smaller request lands in its place.
fn heap_self_test() {
    let before = heap_stats();
    let alloc = |size| match kalloc(size) {
        Ok(ptr) => ptr.as_ptr() as usize,
        Err(err) => panic!("[demo] kalloc({}) failed: {}.", size, err),
    };

    let p1 = alloc(31);
    let p2 = alloc(64);
    let p3 = alloc(128);
    assert!(p1 % 8 == 0 && p2 % 8 == 0 && p3 % 8 == 0);
    assert!(p1 + 31 <= p2 && p2 + 64 <= p3);

    unsafe { kfree(p2 as *mut u8) };
    let p5 = alloc(48);
    assert_eq!(p5, p2);

    for p in [p1, p3, p5] {
        unsafe { kfree(p as *mut u8) };
    }
    assert_eq!(heap_stats().free, before.free);
    infoln!("[demo] Heap self test passed.");
}

/// Reports once per tick and otherwise passes its turn straight on.
extern "C" fn chatter(id: usize) {
    let mut pacer = Pacer::new();
    loop {
        if pacer.due(ticks()) {
            println!("Task {}: Running... ({})", id, Uptime::now());
        }
        task_yield();
    }
}

/// Read, yield, write back, all under the lock.
extern "C" fn counter(_: usize) {
    for _ in 0..ROUNDS {
        // the holder may be parked mid-section, so wait by yielding
        while !COUNTER_LOCK.try_acquire() {
            task_yield();
        }
        let value = unsafe { addr_of_mut!(COUNTER).read_volatile() };
        task_yield();
        unsafe { addr_of_mut!(COUNTER).write_volatile(value + 1) };
        COUNTER_LOCK.release();
        task_yield();
    }
    FINISHED.fetch_add(1, Ordering::SeqCst);
    loop {
        task_yield();
    }
}

extern "C" fn monitor(workers: usize) {
    while FINISHED.load(Ordering::SeqCst) < workers {
        task_yield();
    }
    let total = unsafe { addr_of_mut!(COUNTER).read_volatile() };
    if total == workers * ROUNDS {
        infoln!("[demo] Shared counter reached {}.", total);
    } else {
        fatalln!("[demo] Shared counter is {}, expected {}.", total, workers * ROUNDS);
    }
    loop {
        task_yield();
    }
}
