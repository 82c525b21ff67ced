//! pomo - Work/break interval timer
//!
//! The heart of the crate is [`engine::TimerEngine`], a state machine that
//! alternates between a work and a break phase and counts completed work
//! sessions. It anchors a running countdown to an absolute deadline, so the
//! remaining time stays correct however late or irregular its polls are.
//!
//! Around it:
//! - `config`: TOML settings with defaults and clamping
//! - `driver`: tokio tick loop plus line-based keyboard commands
//! - `notify`: desktop alerts when a phase completes

pub mod config;
pub mod driver;
pub mod durations;
pub mod engine;
pub mod error;
pub mod notify;
pub mod phase;

pub use config::Settings;
pub use driver::{Command, Driver, DriverOptions};
pub use durations::Durations;
pub use engine::{PollOutcome, Snapshot, TimerEngine};
pub use error::{EngineError, EngineResult};
pub use notify::{Alert, Backend, Notifier};
pub use phase::{Phase, Status};
