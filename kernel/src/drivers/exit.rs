use crate::config::VIRT_TEST;

const EXIT_SUCCESS: u32 = 0x5555; // Equals `exit(0)`. qemu successful exit
const EXIT_FAILURE_FLAG: u32 = 0x3333;
const EXIT_FAILURE: u32 = exit_code_encode(1); // Equals `exit(1)`. qemu failed exit
const EXIT_RESET: u32 = 0x7777; // qemu reset

/// Encode the exit code using EXIT_FAILURE_FLAG.
const fn exit_code_encode(code: u32) -> u32 {
    (code << 16) | EXIT_FAILURE_FLAG
}

/// Map a plain exit code to the value the sifive_test device expects.
const fn exit_code_word(code: u32) -> u32 {
    match code {
        0 => EXIT_SUCCESS,
        EXIT_SUCCESS | EXIT_FAILURE | EXIT_RESET => code,
        _ => exit_code_encode(code),
    }
}

/// A handler that handles exit in QEMU.
pub struct QemuExit {
    /// Address of the sifive_test mapped device.
    addr: usize,
}

pub const QEMU_EXIT: QemuExit = QemuExit::new(VIRT_TEST);

impl QemuExit {
    pub const fn new(addr: usize) -> Self {
        QemuExit { addr }
    }

    /// Exit qemu with specified exit code.
    ///
    /// Only meaningful on the QEMU virt machine; elsewhere the write goes nowhere and the call spins.
    pub fn exit(&self, code: u32) -> ! {
        unsafe {
            (self.addr as *mut u32).write_volatile(exit_code_word(code));
        }
        loop {
            core::hint::spin_loop();
        }
    }

    pub fn exit_failure(&self) -> ! {
        self.exit(EXIT_FAILURE);
    }
}
