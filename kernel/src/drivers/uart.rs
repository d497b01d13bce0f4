use bitflags::bitflags;
use volatile::{ReadOnly, Volatile};

use crate::config::VIRT_UART;

/// Divisor for 38.4K baud from the 1.8432 MHz reference clock.
const DIVISOR_38400: u8 = 3;

/// The first six NS16550A registers.
///
/// With `LineControl::DIVISOR_LATCH` set, `thr` and `ier` address the low and high divisor bytes.
#[repr(C)]
struct Registers {
    thr: Volatile<u8>,
    ier: Volatile<u8>,
    fcr: Volatile<FifoControl>,
    lcr: Volatile<LineControl>,
    mcr: Volatile<ModemControl>,
    lsr: ReadOnly<LineStatus>,
}

bitflags! {
    struct FifoControl: u8 {
        const ENABLE = 1 << 0;
        const CLEAR_RX = 1 << 1;
        const CLEAR_TX = 1 << 2;
    }

    struct LineControl: u8 {
        const WORD_8 = 0b11;
        const DIVISOR_LATCH = 1 << 7;
    }

    struct ModemControl: u8 {
        const DATA_TERMINAL_READY = 1 << 0;
        const REQUEST_TO_SEND = 1 << 1;
    }

    struct LineStatus: u8 {
        const OUTPUT_EMPTY = 1 << 5;
    }
}

/// Write-only console on the NS16550A at [`VIRT_UART`], polled, interrupts off.
pub struct Uart {
    base: usize,
}

pub static UART: Uart = Uart::new(VIRT_UART);

impl Uart {
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    fn registers(&self) -> &'static mut Registers {
        unsafe { &mut *(self.base as *mut Registers) }
    }

    /// 8 data bits, no parity, 1 stop bit at 38.4K.
    pub fn init(&self) {
        let regs = self.registers();
        regs.ier.write(0);

        regs.lcr.write(LineControl::DIVISOR_LATCH);
        regs.thr.write(DIVISOR_38400);
        regs.ier.write(0);

        regs.lcr.write(LineControl::WORD_8);
        regs.fcr
            .write(FifoControl::ENABLE | FifoControl::CLEAR_RX | FifoControl::CLEAR_TX);
        regs.mcr
            .write(ModemControl::DATA_TERMINAL_READY | ModemControl::REQUEST_TO_SEND);
    }

    /// Spin until the transmitter holding register is free, then write `byte`.
    pub fn send(&self, byte: u8) {
        let regs = self.registers();
        while !regs.lsr.read().contains(LineStatus::OUTPUT_EMPTY) {
            core::hint::spin_loop();
        }
        regs.thr.write(byte);
    }
}
