//! Configured phase lengths

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::phase::Phase;

/// Longest accepted work phase, in minutes
pub const MAX_WORK_MINUTES: u32 = 60;
/// Longest accepted break phase, in minutes
pub const MAX_BREAK_MINUTES: u32 = 30;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Work and break lengths, in minutes.
///
/// Only [`Durations::new`] and [`Durations::clamped`] build one, so a
/// `Durations` in hand is always within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Durations {
    work_minutes: u32,
    break_minutes: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl Durations {
    /// Validate and build a pair of durations
    pub fn new(work_minutes: u32, break_minutes: u32) -> EngineResult<Self> {
        check(Phase::Work, work_minutes, MAX_WORK_MINUTES)?;
        check(Phase::Break, break_minutes, MAX_BREAK_MINUTES)?;
        Ok(Self {
            work_minutes,
            break_minutes,
        })
    }

    /// Build durations from raw user input, pulling each value into range
    pub fn clamped(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            work_minutes: work_minutes.clamp(1, MAX_WORK_MINUTES),
            break_minutes: break_minutes.clamp(1, MAX_BREAK_MINUTES),
        }
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    /// Length of a phase in seconds
    pub fn seconds(&self, phase: Phase) -> u64 {
        let minutes = match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        };
        u64::from(minutes) * 60
    }
}

fn check(phase: Phase, minutes: u32, max: u32) -> EngineResult<()> {
    if minutes == 0 || minutes > max {
        return Err(EngineError::InvalidDuration {
            phase,
            minutes,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let d = Durations::default();
        assert_eq!(d.seconds(Phase::Work), 25 * 60);
        assert_eq!(d.seconds(Phase::Break), 5 * 60);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Durations::new(1, 1).is_ok());
        assert!(Durations::new(60, 30).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            Durations::new(0, 5),
            Err(EngineError::InvalidDuration { phase: Phase::Work, minutes: 0, .. })
        ));
        assert!(matches!(
            Durations::new(61, 5),
            Err(EngineError::InvalidDuration { phase: Phase::Work, .. })
        ));
        assert!(matches!(
            Durations::new(25, 31),
            Err(EngineError::InvalidDuration { phase: Phase::Break, max: 30, .. })
        ));
    }

    #[test]
    fn test_clamped() {
        let d = Durations::clamped(0, 99);
        assert_eq!(d.work_minutes(), 1);
        assert_eq!(d.break_minutes(), MAX_BREAK_MINUTES);
    }
}
