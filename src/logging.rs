//! Thin logging setup, mirroring the teacher's `log` + `simplelog` stack.
//!
//! Library code never installs a logger itself — only a driver binary or demo
//! calls [`init_logging`]. Everything else goes through the plain `log` facade.

use std::sync::atomic::{AtomicBool, Ordering};

use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

pub fn init_logging(level: log::LevelFilter) {
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

/// Fires a `log::warn!` exactly once per call site, to keep per-step warnings
/// (non-convergence, neighbor overflow) from flooding the log across
/// thousands of timesteps.
pub struct WarnOnce {
    fired: AtomicBool,
}

impl WarnOnce {
    pub const fn new() -> Self {
        WarnOnce {
            fired: AtomicBool::new(false),
        }
    }

    pub fn warn_once(&self, message: impl FnOnce() -> String) {
        if !self.fired.swap(true, Ordering::Relaxed) {
            log::warn!("{}", message());
        }
    }

    pub fn reset(&self) {
        self.fired.store(false, Ordering::Relaxed);
    }
}

impl Default for WarnOnce {
    fn default() -> Self {
        Self::new()
    }
}
