#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod io;

pub mod config;
pub mod drivers;
pub mod heap;
pub mod task;
pub mod time;
pub mod trap;
