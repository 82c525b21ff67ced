//! Periodic driver for the timer engine
//!
//! Owns the engine, polls it on a fixed tick while it is running, reads one
//! command per input line, and renders a status line (or JSON) whenever what
//! the user would see changes.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::durations::Durations;
use crate::engine::{PollOutcome, Snapshot, TimerEngine};
use crate::error::EngineError;
use crate::notify::{Alert, Notifier};
use crate::phase::{Phase, Status};

// ANSI color codes
const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const CYAN: &str = "\x1b[0;36m";
const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\r\x1b[2K";

const BAR_WIDTH: usize = 20;

pub const HELP: &str = "\
commands:
  s, <enter>   start / pause
  r            reset the current phase
  n            skip to the other phase
  a            advance after a phase finishes
  c WORK BREAK set durations in minutes
  h            show this help
  q            quit";

/// A single line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Reset,
    Skip,
    Advance,
    Configure { work: u32, brk: u32 },
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or("").to_lowercase();

        let command = match head.as_str() {
            "" | "s" | "start" | "pause" => Command::Toggle,
            "r" | "reset" => Command::Reset,
            "n" | "skip" => Command::Skip,
            "a" | "advance" => Command::Advance,
            "h" | "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            "c" | "config" => {
                let (Some(work), Some(brk), None) = (words.next(), words.next(), words.next()) else {
                    bail!("usage: c WORK BREAK");
                };
                let work = work
                    .parse()
                    .with_context(|| format!("invalid work minutes: {}", work))?;
                let brk = brk
                    .parse()
                    .with_context(|| format!("invalid break minutes: {}", brk))?;
                return Ok(Command::Configure { work, brk });
            }
            other => bail!("unknown command: {} (h for help)", other),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument: {}", extra);
        }
        Ok(command)
    }
}

/// Whether the driver should keep going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Output and behavior knobs for [`Driver`]
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub tick: Duration,
    /// Advance and start the next phase as soon as one completes
    pub auto_continue: bool,
    /// Emit one JSON snapshot per line instead of a status line
    pub json: bool,
    /// Redraw the status line in place with ANSI colors
    pub in_place: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(crate::config::DEFAULT_TICK_MS),
            auto_continue: false,
            json: false,
            in_place: false,
        }
    }
}

pub struct Driver {
    engine: TimerEngine,
    notifier: Option<Arc<dyn Notifier>>,
    options: DriverOptions,
    last_rendered: Option<Snapshot>,
}

impl Driver {
    pub fn new(engine: TimerEngine, options: DriverOptions) -> Self {
        Self {
            engine,
            notifier: None,
            options,
            last_rendered: None,
        }
    }

    /// Send an alert through `notifier` whenever a phase completes
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    /// Apply one command to the engine
    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<Flow, EngineError> {
        match command {
            Command::Toggle => match self.engine.status() {
                Status::Running => self.engine.pause(now)?,
                Status::Idle => self.engine.start(now)?,
                Status::Finished => {
                    self.engine.advance()?;
                    self.engine.start(now)?;
                }
            },
            Command::Reset => {
                if self.engine.status() == Status::Running {
                    self.engine.pause(now)?;
                }
                self.engine.reset()?;
            }
            Command::Skip => {
                self.engine.skip();
            }
            Command::Advance => {
                self.engine.advance()?;
            }
            Command::Configure { work, brk } => {
                let durations = Durations::clamped(work, brk);
                self.engine
                    .configure(durations.work_minutes(), durations.break_minutes())?;
            }
            Command::Help => {}
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Poll the engine once. Returns the alert to send if a phase just ended.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        let PollOutcome::Completed { phase } = self.engine.poll(now) else {
            return None;
        };

        let alert = Alert::phase_complete(phase, self.engine.sessions_completed());

        if self.options.auto_continue {
            let next = self
                .engine
                .advance()
                .and_then(|next| self.engine.start(now).map(|_| next));
            match next {
                Ok(next) => debug!(phase = %next, "auto-continued into next phase"),
                Err(e) => warn!(error = %e, "could not auto-continue"),
            }
        }

        Some(alert)
    }

    /// Render the current state, or `None` when nothing visible changed
    pub fn render(&mut self, now: DateTime<Utc>) -> Result<Option<String>> {
        let snapshot = self.engine.snapshot(now);
        if self.last_rendered.as_ref() == Some(&snapshot) {
            return Ok(None);
        }

        let line = if self.options.json {
            let mut json = serde_json::to_string(&snapshot).context("Failed to serialize snapshot")?;
            json.push('\n');
            json
        } else if self.options.in_place {
            format!("{}{}", CLEAR_LINE, status_line(&snapshot, true))
        } else {
            format!("{}\n", status_line(&snapshot, false))
        };

        self.last_rendered = Some(snapshot);
        Ok(Some(line))
    }

    /// Drive the engine until `quit` or end of input, returning the final engine
    pub async fn run<R, W>(mut self, input: R, output: &mut W) -> Result<TimerEngine>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut interval = time::interval(self.options.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if !self.options.json {
            self.write_message(output, HELP).await?;
        }
        self.write_render(output, Utc::now()).await?;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.engine.status() != Status::Running {
                        continue;
                    }
                    let now = Utc::now();
                    if let Some(alert) = self.tick(now) {
                        self.send_alert(alert);
                    }
                    self.write_render(output, now).await?;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        debug!("input closed");
                        break;
                    };

                    let command = match Command::parse(&line) {
                        Ok(command) => command,
                        Err(e) => {
                            self.write_message(output, &e.to_string()).await?;
                            continue;
                        }
                    };

                    let now = Utc::now();
                    match self.apply(command, now) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => self.write_message(output, &e.to_string()).await?,
                    }
                    if command == Command::Help && !self.options.json {
                        self.write_message(output, HELP).await?;
                    }
                    self.write_render(output, now).await?;
                }
            }
        }

        if self.options.in_place {
            output.write_all(b"\n").await?;
        }
        output.flush().await?;
        Ok(self.engine)
    }

    /// Deliver an alert off the tick path. Failures are logged, never fatal.
    fn send_alert(&self, alert: Alert) -> Option<JoinHandle<()>> {
        let notifier = self.notifier.clone()?;

        Some(tokio::task::spawn_blocking(move || {
            if let Err(e) = notifier.notify(&alert) {
                warn!(error = %e, "failed to send phase alert");
            }
        }))
    }

    async fn write_render<W: AsyncWrite + Unpin>(&mut self, output: &mut W, now: DateTime<Utc>) -> Result<()> {
        if let Some(line) = self.render(now)? {
            output.write_all(line.as_bytes()).await?;
            output.flush().await?;
        }
        Ok(())
    }

    async fn write_message<W: AsyncWrite + Unpin>(&mut self, output: &mut W, message: &str) -> Result<()> {
        if self.options.json {
            let json = serde_json::json!({ "message": message });
            output.write_all(format!("{}\n", json).as_bytes()).await?;
        } else {
            let prefix = if self.options.in_place { CLEAR_LINE } else { "" };
            output.write_all(format!("{}{}\n", prefix, message).as_bytes()).await?;
        }
        // the status line was overwritten, draw it again next time
        self.last_rendered = None;
        Ok(())
    }
}

fn color(enabled: bool, code: &str, text: &str) -> String {
    if enabled {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

/// One-line human readable view of a snapshot
pub fn status_line(snapshot: &Snapshot, colors: bool) -> String {
    let phase_color = match snapshot.phase {
        Phase::Work => RED,
        Phase::Break => GREEN,
    };
    let label = format!("{:<5}", snapshot.phase.as_str().to_uppercase());

    format!(
        "{} {} [{}] {:>3}%  {} {}  ({})",
        color(colors, &format!("{}{}", BOLD, phase_color), &label),
        snapshot.clock,
        pomo_core::progress_bar(snapshot.progress, BAR_WIDTH),
        (snapshot.progress * 100.0).round() as u32,
        color(colors, CYAN, "sessions:"),
        snapshot.sessions_completed,
        snapshot.status,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn driver(work: u32, brk: u32, auto_continue: bool) -> Driver {
        let engine = TimerEngine::new(Durations::new(work, brk).unwrap());
        Driver::new(
            engine,
            DriverOptions {
                auto_continue,
                ..Default::default()
            },
        )
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Alert>>);

    impl Notifier for Recorder {
        fn notify(&self, alert: &Alert) -> Result<()> {
            self.0.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("").unwrap(), Command::Toggle);
        assert_eq!(Command::parse("  s ").unwrap(), Command::Toggle);
        assert_eq!(Command::parse("R").unwrap(), Command::Reset);
        assert_eq!(Command::parse("skip").unwrap(), Command::Skip);
        assert_eq!(Command::parse("a").unwrap(), Command::Advance);
        assert_eq!(Command::parse("q").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse("c 30 10").unwrap(),
            Command::Configure { work: 30, brk: 10 }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse("launch").is_err());
        assert!(Command::parse("c 30").is_err());
        assert!(Command::parse("c 30 ten").is_err());
        assert!(Command::parse("c 30 10 5").is_err());
        assert!(Command::parse("q now").is_err());
    }

    #[test]
    fn test_toggle_starts_and_pauses() {
        let mut d = driver(1, 1, false);
        d.apply(Command::Toggle, t0()).unwrap();
        assert_eq!(d.engine().status(), Status::Running);
        d.apply(Command::Toggle, t0() + chrono::Duration::seconds(20)).unwrap();
        assert_eq!(d.engine().status(), Status::Idle);
        assert_eq!(d.engine().remaining_at(t0()), 40);
    }

    #[test]
    fn test_toggle_after_finish_moves_on() {
        let mut d = driver(1, 1, false);
        d.apply(Command::Toggle, t0()).unwrap();
        assert!(d.tick(t0() + chrono::Duration::seconds(60)).is_some());

        let later = t0() + chrono::Duration::seconds(90);
        d.apply(Command::Toggle, later).unwrap();
        assert_eq!(d.engine().phase(), Phase::Break);
        assert_eq!(d.engine().status(), Status::Running);
    }

    #[test]
    fn test_reset_while_running_pauses_first() {
        let mut d = driver(25, 5, false);
        d.apply(Command::Toggle, t0()).unwrap();
        d.apply(Command::Reset, t0() + chrono::Duration::seconds(100)).unwrap();
        assert_eq!(d.engine().status(), Status::Idle);
        assert_eq!(d.engine().remaining_at(t0()), 25 * 60);
    }

    #[test]
    fn test_configure_clamps_input() {
        let mut d = driver(25, 5, false);
        d.apply(Command::Configure { work: 90, brk: 0 }, t0()).unwrap();
        assert_eq!(d.engine().durations(), Durations::new(60, 1).unwrap());
    }

    #[test]
    fn test_advance_before_finish_is_reported() {
        let mut d = driver(25, 5, false);
        let err = d.apply(Command::Advance, t0()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { operation: "advance", .. }));
    }

    #[test]
    fn test_quit() {
        let mut d = driver(25, 5, false);
        assert_eq!(d.apply(Command::Quit, t0()).unwrap(), Flow::Quit);
        assert_eq!(d.apply(Command::Help, t0()).unwrap(), Flow::Continue);
    }

    #[test]
    fn test_tick_alerts_once_per_completion() {
        let mut d = driver(1, 1, false);
        d.apply(Command::Toggle, t0()).unwrap();

        assert!(d.tick(t0() + chrono::Duration::seconds(30)).is_none());
        let alert = d.tick(t0() + chrono::Duration::seconds(61)).unwrap();
        assert!(alert.message.contains("Work session 1 complete"));
        assert!(d.tick(t0() + chrono::Duration::seconds(62)).is_none());
        assert_eq!(d.engine().status(), Status::Finished);
    }

    #[test]
    fn test_auto_continue_starts_next_phase() {
        let mut d = driver(1, 2, true);
        d.apply(Command::Toggle, t0()).unwrap();

        let done = t0() + chrono::Duration::seconds(60);
        assert!(d.tick(done).is_some());
        assert_eq!(d.engine().phase(), Phase::Break);
        assert_eq!(d.engine().status(), Status::Running);
        assert_eq!(d.engine().deadline(), Some(done + chrono::Duration::seconds(120)));
        assert_eq!(d.engine().sessions_completed(), 1);
    }

    #[test]
    fn test_render_only_on_change() {
        let mut d = driver(25, 5, false);
        let first = d.render(t0()).unwrap().unwrap();
        assert!(first.contains("WORK"));
        assert!(first.contains("25:00"));
        assert!(first.contains("(idle)"));
        assert!(d.render(t0()).unwrap().is_none());

        d.apply(Command::Skip, t0()).unwrap();
        let second = d.render(t0()).unwrap().unwrap();
        assert!(second.contains("BREAK"));
        assert!(second.contains("05:00"));
    }

    #[test]
    fn test_status_line_without_colors_has_no_escapes() {
        let d = driver(25, 5, false);
        let line = status_line(&d.engine().snapshot(t0()), false);
        assert!(!line.contains('\x1b'));
        assert!(line.contains("sessions: 0"));
    }

    #[tokio::test]
    async fn test_run_applies_commands_until_quit() {
        let d = driver(25, 5, false);
        let input: &[u8] = b"c 30 10\nbogus\nq\n";
        let mut output = Vec::new();

        let engine = d.run(input, &mut output).await.unwrap();
        assert_eq!(engine.durations(), Durations::new(30, 10).unwrap());
        assert_eq!(engine.remaining_at(Utc::now()), 30 * 60);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("30:00"));
        assert!(text.contains("unknown command: bogus"));
    }

    #[tokio::test]
    async fn test_run_json_output_and_end_of_input() {
        let engine = TimerEngine::new(Durations::new(25, 5).unwrap());
        let d = Driver::new(
            engine,
            DriverOptions {
                json: true,
                ..Default::default()
            },
        );
        let input: &[u8] = b"n\n";
        let mut output = Vec::new();

        let engine = d.run(input, &mut output).await.unwrap();
        assert_eq!(engine.phase(), Phase::Break);

        let text = String::from_utf8(output).unwrap();
        let last: serde_json::Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
        assert_eq!(last["phase"], "break");
        assert_eq!(last["status"], "idle");
        assert_eq!(last["remaining_seconds"], 300);
    }

    #[tokio::test]
    async fn test_completion_reaches_notifier() {
        let recorder = Arc::new(Recorder::default());
        let mut d = driver(1, 1, false).with_notifier(recorder.clone());
        d.apply(Command::Toggle, t0()).unwrap();

        let alert = d.tick(t0() + chrono::Duration::seconds(60)).unwrap();
        d.send_alert(alert.clone()).unwrap().await.unwrap();

        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent.as_slice(), &[alert]);
    }

    #[test]
    fn test_no_notifier_sends_nothing() {
        let d = driver(1, 1, false);
        assert!(d.send_alert(Alert::phase_complete(Phase::Work, 1)).is_none());
    }
}
