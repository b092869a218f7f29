#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{
    Once,
    atomic::{AtomicUsize, Ordering},
};

pub struct Logger;

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 20,  // White
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        eprintln!(
            "\u{1B}[{}m[{:}] {}\u{1B}[0m",
            color,
            record.level(),
            record.args(),
        );
    }

    fn flush(&self) {}
}

/// Install the stderr logger once per test binary.
pub fn init() {
    static LOGGER: Logger = Logger;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // another test harness may have installed one already
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Debug);
    });
}

/// Object under test: a counter that is only touched through `&self`.
pub struct Counter {
    pub hits: AtomicUsize,
}

impl Counter {
    pub fn new() -> Counter {
        Counter {
            hits: AtomicUsize::new(0),
        }
    }

    pub fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}
