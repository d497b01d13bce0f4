use core::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

#[cfg(bare_metal)]
use crate::config::{CLINT, SYSTEM_TICK};
#[cfg(bare_metal)]
use riscv::register::*;

/// Timer interrupts taken since boot, one per [`crate::config::SYSTEM_TICK`].
static TICKS: AtomicUsize = AtomicUsize::new(0);

pub fn ticks() -> usize {
    TICKS.load(Ordering::Relaxed)
}

/// Time since boot counted in ticks of one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub hours: usize,
    pub minutes: usize,
    pub seconds: usize,
}

impl Uptime {
    pub fn from_ticks(ticks: usize) -> Self {
        Self {
            hours: ticks / 3600,
            minutes: ticks / 60 % 60,
            seconds: ticks % 60,
        }
    }

    pub fn now() -> Self {
        Self::from_ticks(ticks())
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Account one timer interrupt and arm the next one.
pub fn tick() {
    let ticks = TICKS.fetch_add(1, Ordering::Relaxed) + 1;
    #[cfg(bare_metal)]
    set_timer(hart_id(), get_time() + SYSTEM_TICK);
    debugln!(try "[timer] Uptime {}.", Uptime::from_ticks(ticks));
}

#[cfg(bare_metal)]
pub fn hart_id() -> usize {
    mhartid::read()
}

#[cfg(bare_metal)]
pub fn set_timer(id: usize, time: usize) {
    unsafe {
        let timer = (CLINT + 0x4000 + 8 * id) as *mut usize;
        timer.write_volatile(time);
    }
}

#[cfg(bare_metal)]
pub fn get_time() -> usize {
    unsafe {
        let time = (CLINT + 0xbff8) as *const usize;
        time.read_volatile()
    }
}

/// Arm the first timer interrupt and unmask it.
///
/// The global enable bit stays as it is: tasks turn it on when they start.
#[cfg(bare_metal)]
pub fn init_timer() {
    set_timer(hart_id(), get_time() + SYSTEM_TICK);
    unsafe {
        mie::set_mtimer();
    }
}

/// Lets a periodic job through at most once per tick.
#[derive(Debug, Default)]
pub struct Pacer {
    last: Option<usize>,
}

impl Pacer {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// True on the first call and then whenever `now` has moved past the last tick let through.
    pub fn due(&mut self, now: usize) -> bool {
        if self.last == Some(now) {
            return false;
        }
        self.last = Some(now);
        true
    }
}
