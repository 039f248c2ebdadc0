//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, processing started.
    Start,
    /// Request classified (EDM or pass-through).
    Classified,
    /// A trailing-slash redirect was issued.
    Redirected,
    /// The first origin fetch returned.
    Fetched,
    /// Error recovery is running the given attempt (1-based).
    Retrying(u32),
    /// Request completed.
    Completion,
}

impl LifecyclePhase {
    /// Short name used in logs.
    pub fn name(&self) -> String {
        match self {
            Self::Start => "start".to_string(),
            Self::Classified => "classified".to_string(),
            Self::Redirected => "redirected".to_string(),
            Self::Fetched => "fetched".to_string(),
            Self::Retrying(attempt) => format!("retrying_{}", attempt),
            Self::Completion => "completion".to_string(),
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark. A later mark with the same name replaces it.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        self.mark(&phase.name());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time between two named marks, if both were recorded in order.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        to.checked_duration_since(*from)
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::Start.name(), "start");
        assert_eq!(LifecyclePhase::Retrying(1).name(), "retrying_1");
    }

    #[test]
    fn test_between_marks() {
        let mut timing = TimingContext::new();
        timing.mark("origin_fetch");
        timing.mark_phase(&LifecyclePhase::Completion);

        assert!(timing.between("origin_fetch", "completion").is_some());
        assert!(timing.between("completion", "missing").is_none());
    }
}
