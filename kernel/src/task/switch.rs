use core::arch::global_asm;

use riscv::register::mstatus;

use super::context::{ContextSwitch, TaskContext};

global_asm!(include_str!("switch.s"));

extern "C" {
    fn _switch(curr: *mut TaskContext, next: *const TaskContext);
    fn _task_entry();
}

/// Switches between contexts with `_switch`, keeping machine interrupts off across it.
///
/// Each context gets back the interrupt enable bit it had when it switched away. Tasks start
/// with interrupts on, the scheduler loop runs with them off.
pub struct RiscvSwitch;

impl ContextSwitch for RiscvSwitch {
    fn trampoline(&self) -> usize {
        _task_entry as usize
    }

    unsafe fn switch(&self, curr: *mut TaskContext, next: *const TaskContext) {
        let mie = mstatus::read().mie();
        mstatus::clear_mie();
        _switch(curr, next);
        if mie {
            mstatus::set_mie();
        }
    }
}

#[no_mangle]
extern "C" fn task_returned() -> ! {
    panic!("[scheduler] A task returned from its entry function.");
}
