#![allow(dead_code)]

pub use gulptree_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

/// Poll `cond` until it holds, panicking after a bounded number of attempts.
pub async fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
