use core::fmt::{Arguments, Write};

use super::console_putchar;

pub struct Stdout;

impl Stdout {
    pub fn putchar(&self, c: u8) {
        console_putchar(c);
    }

    pub fn print(&mut self, args: Arguments) {
        // writing to the console never fails
        let _ = self.write_fmt(args);
    }
}

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(|c| self.putchar(c));
        Ok(())
    }
}

#[macro_export]
macro_rules! print {
    ($fmt: literal $($t: tt)*) => {
        $crate::io::stdout().print(format_args!($fmt $($t)*));
    };
}

#[macro_export]
macro_rules! println {
    ($fmt: literal $($t: tt)*) => {
        $crate::io::stdout().print(format_args!(concat!($fmt, "\n") $($t)*));
    };
}
