//! # Progress — Atomic Validation Progress Counters
//!
//! Thread-safe counters shared between the claim validator (possibly running
//! on several rayon workers) and a background status reporter. Counters are
//! atomics; the current claim id sits behind a Mutex and changes once per
//! claim, not per sample.
//!
//! ## Background Reporter
//!
//! `start_reporter` spawns a thread that logs samples run, successes, claims
//! finished, the sample rate and the current claim at a fixed interval. It
//! exits shortly after `stop`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

pub struct Progress {
    pub samples: AtomicU64,
    pub successes: AtomicU64,
    pub claims: AtomicU64,
    pub current: Mutex<String>,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            samples: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            claims: AtomicU64::new(0),
            current: Mutex::new(String::new()),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Log a status line every `interval` until [`Progress::stop`]. The
    /// thread wakes at least every 100 ms so joining it after `stop` is quick.
    pub fn start_reporter(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        let tick = interval.min(Duration::from_millis(100));
        thread::spawn(move || {
            let mut since_report = Duration::ZERO;
            while !progress.shutdown.load(Ordering::Relaxed) {
                thread::sleep(tick);
                since_report += tick;
                if since_report >= interval {
                    progress.print_status();
                    since_report = Duration::ZERO;
                }
            }
        })
    }

    pub fn print_status(&self) {
        let elapsed = self.start.elapsed();
        let samples = self.samples.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let claims = self.claims.load(Ordering::Relaxed);
        let current = self
            .current
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            samples as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            current = %current,
            samples,
            successes,
            claims,
            rate = format_args!("{:.2}", rate),
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "validation progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
