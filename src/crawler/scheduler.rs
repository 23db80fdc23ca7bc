//! Request pacing
//!
//! This module handles:
//! - Random pauses after every probe
//! - Longer random pauses between listing pages
//!
//! The pauses keep the request pattern slow and irregular so the directory
//! and the probed sites never see a burst.

use crate::config::CrawlConfig;
use rand::Rng;
use std::time::Duration;

/// A closed range of pause durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    /// Builds a window from bounds in seconds
    ///
    /// Negative or non-finite bounds are clamped to zero and the bounds are
    /// swapped if given in the wrong order.
    pub fn from_secs(min: f64, max: f64) -> Self {
        let clamp = |secs: f64| {
            if secs.is_finite() && secs > 0.0 {
                Duration::from_secs_f64(secs)
            } else {
                Duration::ZERO
            }
        };
        let (min, max) = (clamp(min), clamp(max));
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn zero() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draws a uniformly distributed duration within the window
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Pacer sleeps between probes and between listing pages
#[derive(Debug, Clone)]
pub struct Pacer {
    entry_window: DelayWindow,
    page_window: DelayWindow,
}

impl Pacer {
    pub fn new(entry_window: DelayWindow, page_window: DelayWindow) -> Self {
        Self {
            entry_window,
            page_window,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            DelayWindow::from_secs(config.min_delay_secs, config.max_delay_secs),
            DelayWindow::from_secs(config.min_page_delay_secs, config.max_page_delay_secs),
        )
    }

    pub fn entry_window(&self) -> DelayWindow {
        self.entry_window
    }

    pub fn page_window(&self) -> DelayWindow {
        self.page_window
    }

    /// Sleeps after a probe, whatever its outcome
    pub async fn pause_after_entry(&self) -> Duration {
        let delay = self.entry_window.sample(&mut rand::thread_rng());
        tracing::debug!(
            "Waiting {:.1} seconds before next request",
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
        delay
    }

    /// Sleeps between two listing pages
    pub async fn pause_between_pages(&self) -> Duration {
        let delay = self.page_window.sample(&mut rand::thread_rng());
        tracing::info!("Waiting {:.1} seconds before next page", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
        delay
    }
}
