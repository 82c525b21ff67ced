//! Phase-complete alerts
//!
//! Desktop notifications on macOS (osascript) and Linux (notify-send), with a
//! terminal bell everywhere else. Alerts never touch the engine; a failed
//! alert is the caller's to log and ignore.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::Command;

use crate::phase::Phase;

/// Title used for every alert
pub const ALERT_TITLE: &str = "pomo";

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    /// Whether to play a sound
    pub sound: bool,
}

impl Alert {
    /// Alert for the end of `phase`, mentioning what comes next
    pub fn phase_complete(phase: Phase, sessions_completed: u32) -> Self {
        let message = match phase {
            Phase::Work => format!(
                "Work session {} complete. Time for a break.",
                sessions_completed
            ),
            Phase::Break => "Break over. Back to work.".to_string(),
        };

        Self {
            title: ALERT_TITLE.to_string(),
            message,
            sound: true,
        }
    }

    /// Disable sound
    pub fn silent(mut self) -> Self {
        self.sound = false;
        self
    }
}

/// Anything that can deliver an [`Alert`]
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Available notification backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// Terminal bell on stderr
    Bell,
}

impl Backend {
    /// Detect the best available backend for the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            return Self::Osascript;
        }

        #[cfg(target_os = "linux")]
        {
            if Self::command_exists("notify-send") {
                return Self::NotifySend;
            }
            return Self::Bell;
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Self::Bell
        }
    }

    fn command_exists(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Bell => "bell",
        }
    }

    fn send_osascript(&self, alert: &Alert) -> Result<()> {
        let title = alert.title.replace('"', r#"\""#);
        let message = alert.message.replace('"', r#"\""#);

        let mut script = format!(r#"display notification "{}" with title "{}""#, message, title);
        if alert.sound {
            script.push_str(r#" sound name "default""#);
        }

        let status = Command::new("osascript")
            .args(["-e", &script])
            .status()
            .context("Failed to run osascript")?;

        if !status.success() {
            bail!("osascript failed with status: {}", status);
        }
        Ok(())
    }

    fn send_notify_send(&self, alert: &Alert) -> Result<()> {
        let status = Command::new("notify-send")
            .args(["--app-name", ALERT_TITLE, &alert.title, &alert.message])
            .status()
            .context("Failed to run notify-send")?;

        if !status.success() {
            bail!("notify-send failed with status: {}", status);
        }
        if alert.sound {
            ring_bell()?;
        }
        Ok(())
    }
}

impl Notifier for Backend {
    fn notify(&self, alert: &Alert) -> Result<()> {
        match self {
            Self::Osascript => self.send_osascript(alert),
            Self::NotifySend => self.send_notify_send(alert),
            Self::Bell => {
                eprintln!("[{}] {}", alert.title, alert.message);
                if alert.sound {
                    ring_bell()?;
                }
                Ok(())
            }
        }
    }
}

fn ring_bell() -> Result<()> {
    let mut stderr = std::io::stderr();
    stderr.write_all(b"\x07").context("Failed to ring terminal bell")?;
    stderr.flush()?;
    Ok(())
}
