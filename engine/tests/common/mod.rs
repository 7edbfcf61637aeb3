#![allow(dead_code)]

use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use engine::WeightSource;
use model::{INPUT_SIZE, NUM_CLASSES};
use serde_json::json;

pub const HIDDEN: usize = 4;

/// A 784 -> 4 -> 10 network whose hidden unit `h` sums every fourth pixel starting at `h`,
/// and whose class `h + 2` reads hidden unit `h`.
pub fn mnist_weights() -> Vec<u8> {
    let kernel1: Vec<f32> = (0..INPUT_SIZE * HIDDEN)
        .map(|k| if (k / HIDDEN) % HIDDEN == k % HIDDEN { 0.05 } else { 0. })
        .collect();
    let kernel2: Vec<f32> = (0..HIDDEN * NUM_CLASSES)
        .map(|k| if k % NUM_CLASSES == k / NUM_CLASSES + 2 { 1. } else { 0. })
        .collect();
    let mut bias2 = vec![0.; NUM_CLASSES];
    bias2[7] = 0.05;

    serde_json::to_vec(&json!({
        "dense1": {"kernel": kernel1, "bias": [0.1, 0., 0., 0.], "shape": [INPUT_SIZE, HIDDEN]},
        "dense2": {"kernel": kernel2, "bias": bias2, "shape": [HIDDEN, NUM_CLASSES]},
    }))
    .unwrap()
}

/// A source that takes a while to answer and counts how often it's asked, failing the first
/// `failures` fetches.
pub struct SlowSource {
    bytes: Vec<u8>,
    delay: Duration,
    failures: usize,
    fetches: AtomicUsize,
}

impl SlowSource {
    pub fn new(bytes: Vec<u8>, delay: Duration) -> Self {
        Self::failing(bytes, delay, 0)
    }

    pub fn failing(bytes: Vec<u8>, delay: Duration, failures: usize) -> Self {
        Self {
            bytes,
            delay,
            failures,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl WeightSource for SlowSource {
    async fn fetch(&self) -> io::Result<Vec<u8>> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if n < self.failures {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "weights server timed out"));
        }
        Ok(self.bytes.clone())
    }
}
