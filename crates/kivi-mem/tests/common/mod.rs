//! Instrumented element type shared by the integration tests.
//!
//! Counters are thread-local, and the test harness runs each test on its
//! own thread, so tests do not see each other's counts.

#![allow(dead_code)]

use std::cell::Cell;

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
    static CONSTRUCTED: Cell<usize> = const { Cell::new(0) };
    static DROPPED: Cell<usize> = const { Cell::new(0) };
    static FAIL_AT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Counts every construction, clone and drop. Can be armed to panic on the
/// K-th construction.
#[derive(Debug, PartialEq)]
pub struct Probe {
    pub value: i32,
}

fn construct() {
    let attempt = CONSTRUCTED.get() + 1;
    CONSTRUCTED.set(attempt);
    if FAIL_AT.get() == Some(attempt) {
        FAIL_AT.set(None);
        panic!("probe construction {} failed", attempt);
    }
    LIVE.set(LIVE.get() + 1);
}

impl Probe {

    pub fn new(value: i32) -> Self {
        construct();
        Self { value }
    }
}

impl Default for Probe {

    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Probe {

    fn clone(&self) -> Self {
        Self::new(self.value)
    }
}

impl Drop for Probe {

    fn drop(&mut self) {
        LIVE.set(LIVE.get() - 1);
        DROPPED.set(DROPPED.get() + 1);
    }
}

/// Values currently alive.
pub fn live() -> usize {
    LIVE.get()
}

/// Constructions attempted so far, failed ones included.
pub fn constructed() -> usize {
    CONSTRUCTED.get()
}

pub fn dropped() -> usize {
    DROPPED.get()
}

/// Makes the `k`-th construction from now panic. `k` starts at 1.
pub fn fail_after(k: usize) {
    FAIL_AT.set(Some(CONSTRUCTED.get() + k));
}

pub fn values<'a>(probes: impl IntoIterator<Item = &'a Probe>) -> Vec<i32> {
    probes.into_iter().map(|p| p.value).collect()
}

/// Runs `f`, expecting it to panic.
pub fn expect_panic<R>(f: impl FnOnce() -> R) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    assert!(result.is_err(), "expected a panic");
}
