#![cfg_attr(not(test), no_std)]

pub mod lock;

pub use lock::SpinLock;

use core::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
};

/// Data guarded by a [`SpinLock`].
#[derive(Default, Debug)]
pub struct Spin<T> {
    lock: SpinLock,
    data: UnsafeCell<T>,
}

pub struct SpinGuard<'a, T: 'a> {
    spin: &'a Spin<T>,
    data: &'a mut T,
}

impl<T> Spin<T> {
    pub const fn new(data: T) -> Self {
        Self {
            lock: SpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }
}

unsafe impl<T: Send> Sync for Spin<T> {}
unsafe impl<T: Send> Send for Spin<T> {}

impl<T> Spin<T> {
    pub fn lock(&self) -> SpinGuard<T> {
        self.lock.acquire();
        SpinGuard::new(self, unsafe { &mut *self.data.get() }) // bypass mutability check
    }

    pub fn try_lock(&self) -> Option<SpinGuard<T>> {
        if self.lock.try_acquire() {
            Some(SpinGuard::new(self, unsafe { &mut *self.data.get() }))
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<'a, T: 'a> SpinGuard<'a, T> {
    fn new(spin: &'a Spin<T>, data: &'a mut T) -> Self {
        Self { spin, data }
    }
}

impl<T> Deref for SpinGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T> DerefMut for SpinGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data
    }
}

impl<T> Drop for SpinGuard<'_, T> {
    fn drop(&mut self) {
        self.spin.lock.release();
    }
}
