pub mod exit;
pub mod uart;
