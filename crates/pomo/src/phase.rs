//! Phase and status types for the timer engine

use serde::{Deserialize, Serialize};

/// Which half of the work/break cycle the timer is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Work,
    Break,
}

impl Phase {
    /// The phase that follows this one
    pub fn next(&self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "work" => Some(Phase::Work),
            "break" => Some(Phase::Break),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse engine status, without the data each state carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Paused or not yet started
    Idle,
    /// Counting down toward a deadline
    Running,
    /// Deadline reached, waiting for `advance`
    Finished,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Finished => "finished",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
