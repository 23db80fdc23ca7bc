/// Crawl phase definitions for tracking a run's lifecycle
///
/// A run moves `Idle -> ConnectivityCheck`, then either to `Aborted` (the
/// proxy could not be used) or to `Running`, and from `Running` to
/// `Finished`.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Run created, nothing requested yet
    Idle,

    /// Verifying that requests get through the proxy
    ConnectivityCheck,

    /// Walking listing pages and probing entries
    Running,

    // ===== Terminal States =====
    /// Connectivity check failed; no page was fetched
    Aborted,

    /// The crawl loop ended and the final save ran
    Finished,
}

impl CrawlPhase {
    /// Returns true if the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted | Self::Finished)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::ConnectivityCheck)
                | (Self::ConnectivityCheck, Self::Running)
                | (Self::ConnectivityCheck, Self::Aborted)
                | (Self::Running, Self::Finished)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConnectivityCheck => "connectivity_check",
            Self::Running => "running",
            Self::Aborted => "aborted",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
