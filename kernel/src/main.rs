#![no_std]
#![no_main]

#[macro_use]
extern crate rvos;

mod demo;
mod panic;

use core::arch::global_asm;

use rvos::{drivers::uart::UART, heap, task::SCHEDULER, time, trap};

global_asm!(include_str!("entry.s"));

/// Zero `.bss` before anything reads a static.
fn clear_bss() {
    extern "C" {
        fn sbss();
        fn ebss();
    }
    unsafe {
        let start = sbss as usize;
        let len = ebss as usize - start;
        core::slice::from_raw_parts_mut(start as *mut u8, len).fill(0);
    }
}

#[no_mangle]
extern "C" fn rust_main() -> ! {
    clear_bss();
    UART.init();
    println!("Hello, RVOS!");

    heap::init_heap();
    trap::init();
    time::init_timer();

    SCHEDULER.init();
    demo::load();
    SCHEDULER.schedule()
}
