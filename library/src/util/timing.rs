use std::time::{Duration, Instant};

use log::Level;

/// Logs how long a scope took, at `level`, when the timer is dropped.
///
/// Inactive (no clock read, no label built) unless `level` is enabled.
pub struct ScopedTimer {
    label: String,
    level: Level,
    start: Option<Instant>,
}

impl ScopedTimer {
    pub fn lazy<F>(level: Level, label_gen: F) -> Self
    where
        F: FnOnce() -> String,
    {
        if log::log_enabled!(level) {
            Self {
                label: label_gen(),
                level,
                start: Some(Instant::now()),
            }
        } else {
            Self {
                label: String::new(),
                level,
                start: None,
            }
        }
    }

    pub fn debug_lazy<F>(label_gen: F) -> Self
    where
        F: FnOnce() -> String,
    {
        Self::lazy(Level::Debug, label_gen)
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start.map(|start| start.elapsed())
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if let Some(elapsed) = self.elapsed() {
            log::log!(self.level, "{} took {} us", self.label, elapsed.as_micros());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_level_skips_the_label() {
        // No logger is installed in unit tests, so every level is disabled.
        let timer = ScopedTimer::lazy(Level::Trace, || panic!("label must not be built"));
        assert!(!timer.is_active());
        assert_eq!(timer.elapsed(), None);
    }
}
