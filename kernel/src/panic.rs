use core::panic::PanicInfo;

use rvos::drivers::exit::QEMU_EXIT;

#[panic_handler]
fn panic_handler(panic_info: &PanicInfo) -> ! {
    println!("\x1b[31m[kernel] {}\x1b[0m", panic_info);
    QEMU_EXIT.exit_failure()
}
