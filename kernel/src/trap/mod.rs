use core::fmt;

const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);
const CODE_MASK: usize = 0xfff;

#[cfg(bare_metal)]
core::arch::global_asm!(include_str!("trap.s"));

/// Machine-mode trap cause, decoded from `mcause`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    SoftwareInterrupt,
    TimerInterrupt,
    ExternalInterrupt,
    UnknownInterrupt(usize),
    Exception(usize),
}

impl TrapCause {
    pub fn from_mcause(mcause: usize) -> Self {
        let code = mcause & CODE_MASK;
        if mcause & INTERRUPT_BIT == 0 {
            return Self::Exception(code);
        }
        match code {
            3 => Self::SoftwareInterrupt,
            7 => Self::TimerInterrupt,
            11 => Self::ExternalInterrupt,
            _ => Self::UnknownInterrupt(code),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        !matches!(self, Self::Exception(_))
    }

    /// Where execution continues after the trap taken at `epc`.
    ///
    /// Interrupts return to the interrupted instruction, exceptions skip it.
    pub fn resume_pc(&self, epc: usize) -> usize {
        match self {
            Self::Exception(_) => epc.wrapping_add(4),
            _ => epc,
        }
    }
}

impl fmt::Display for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoftwareInterrupt => f.write_str("software interrupt"),
            Self::TimerInterrupt => f.write_str("timer interrupt"),
            Self::ExternalInterrupt => f.write_str("external interrupt"),
            Self::UnknownInterrupt(code) => write!(f, "unknown interrupt {}", code),
            Self::Exception(code) => write!(f, "{} (exception {})", exception_name(*code), code),
        }
    }
}

fn exception_name(code: usize) -> &'static str {
    match code {
        0 => "instruction address misaligned",
        1 => "instruction access fault",
        2 => "illegal instruction",
        3 => "breakpoint",
        4 => "load address misaligned",
        5 => "load access fault",
        6 => "store address misaligned",
        7 => "store access fault",
        8 => "environment call from U-mode",
        9 => "environment call from S-mode",
        11 => "environment call from M-mode",
        12 => "instruction page fault",
        13 => "load page fault",
        15 => "store page fault",
        _ => "reserved",
    }
}

/// Called by `trap_vector` with interrupts off. Returns the pc to resume at.
///
/// Logs only with the `try` form, the interrupted task may be holding the log.
#[no_mangle]
pub extern "C" fn trap_handler(epc: usize, mcause: usize) -> usize {
    let cause = TrapCause::from_mcause(mcause);
    match cause {
        TrapCause::TimerInterrupt => {
            crate::time::tick();
            #[cfg(all(bare_metal, feature = "preempt"))]
            crate::task::SCHEDULER.preempt();
        }
        TrapCause::Exception(_) => {
            warnln!(try "[trap] {} at {:#x}, skipped.", cause, epc);
        }
        _ => {
            warnln!(try "[trap] Unexpected {}.", cause);
        }
    }
    cause.resume_pc(epc)
}

/// Point `mtvec` at `trap_vector`.
#[cfg(bare_metal)]
pub fn init() {
    use riscv::register::mtvec::{self, TrapMode};

    extern "C" {
        fn trap_vector();
    }
    unsafe {
        mtvec::write(trap_vector as usize, TrapMode::Direct);
    }
}
