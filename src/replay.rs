//! Playback state and the command protocol that drives it.
//!
//! A [`ReplayState`] is a cursor over one [`ReplaySession`] plus play/pause
//! and rate flags. Drivers (the CLI, a GUI, a test harness) move it by
//! applying [`ReplayCommand`]s:
//!
//! | command        | value                 | effect                                  |
//! |----------------|-----------------------|-----------------------------------------|
//! | `play`         |                       | start playing (no-op on an empty log)   |
//! | `pause`        |                       | stop playing                            |
//! | `step_forward` |                       | next event, saturating at the last one  |
//! | `step_back`    |                       | previous event, saturating at the first |
//! | `seek`         | absolute event index  | jump to that event                      |
//! | `set_rate`     | positive multiplier   | change playback speed                   |
//!
//! Stepping past either end is a silent no-op. Only a malformed `seek` or
//! `set_rate` value is an error, and a failed command never changes state.
//!
//! The state has no internal locking. A driver with a timer thread must
//! serialize every command against a given state itself.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::EventRecord;
use crate::session::ReplaySession;

/// Longest wall-clock wait [`ReplayState::delay_to_next`] will ask for.
pub const MAX_EVENT_DELAY: Duration = Duration::from_secs(60);

/// Errors reported to a driver. None of them alter playback state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    #[error("invalid {command} command: {reason}")]
    InvalidCommand { command: CommandKind, reason: String },

    #[error("playback rate must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("state belongs to session {expected}, not {found}")]
    SessionMismatch { expected: String, found: String },

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}

/// The command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Play,
    Pause,
    StepForward,
    StepBack,
    /// Value is an absolute event index.
    Seek,
    /// Value is the new playback rate.
    SetRate,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::StepForward => "step_forward",
            Self::StepBack => "step_back",
            Self::Seek => "seek",
            Self::SetRate => "set_rate",
        }
    }

    fn takes_value(self) -> bool {
        matches!(self, Self::Seek | Self::SetRate)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "step_forward" => Ok(Self::StepForward),
            "step_back" => Ok(Self::StepBack),
            "seek" => Ok(Self::Seek),
            "set_rate" => Ok(Self::SetRate),
            other => Err(ReplayError::UnknownCommand(other.to_string())),
        }
    }
}

/// One instruction from a driver.
///
/// Serialized as `{"command": "seek", "value": "12"}`. The textual form
/// accepted by [`FromStr`] is `seek=12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    pub command: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ReplayCommand {
    pub fn new(command: CommandKind) -> Self {
        Self {
            command,
            value: None,
        }
    }

    pub fn play() -> Self {
        Self::new(CommandKind::Play)
    }

    pub fn pause() -> Self {
        Self::new(CommandKind::Pause)
    }

    pub fn step_forward() -> Self {
        Self::new(CommandKind::StepForward)
    }

    pub fn step_back() -> Self {
        Self::new(CommandKind::StepBack)
    }

    pub fn seek(value: impl Into<String>) -> Self {
        Self {
            command: CommandKind::Seek,
            value: Some(value.into()),
        }
    }

    pub fn set_rate(value: impl Into<String>) -> Self {
        Self {
            command: CommandKind::SetRate,
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for ReplayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.command),
            None => write!(f, "{}", self.command),
        }
    }
}

impl FromStr for ReplayCommand {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
            None => (s, None),
        };
        let command: CommandKind = name.parse()?;

        match (command.takes_value(), value) {
            (true, None) => Err(ReplayError::InvalidCommand {
                command,
                reason: "missing value".into(),
            }),
            (false, Some(_)) => Err(ReplayError::InvalidCommand {
                command,
                reason: "takes no value".into(),
            }),
            (_, value) => Ok(Self { command, value }),
        }
    }
}

/// The playback cursor for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayState {
    session_id: String,
    current_index: usize,
    is_playing: bool,
    playback_rate: f64,
    current_timestamp: i64,
    start_timestamp: i64,
}

impl ReplayState {
    /// Paused at the first event (the end sentinel for an empty log), rate 1.0.
    pub fn new(session: &ReplaySession) -> Self {
        let mut state = Self {
            session_id: session.id().to_string(),
            current_index: 0,
            is_playing: false,
            playback_rate: 1.0,
            current_timestamp: 0,
            start_timestamp: session.start_time(),
        };
        state.move_to(session, 0);
        state
    }

    pub fn with_rate(session: &ReplaySession, rate: f64) -> Result<Self, ReplayError> {
        let mut state = Self::new(session);
        state.playback_rate = validate_rate(rate)?;
        Ok(state)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Index of the current event, or `len` once playback has run off the end.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn current_timestamp(&self) -> i64 {
        self.current_timestamp
    }

    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    /// Time since the first event, for relative display.
    pub fn relative_time(&self) -> i64 {
        self.current_timestamp.wrapping_sub(self.start_timestamp)
    }

    pub fn current_event<'s>(&self, session: &'s ReplaySession) -> Option<&'s EventRecord> {
        session.get_event(self.current_index)
    }

    pub fn is_at_end(&self, session: &ReplaySession) -> bool {
        self.current_index >= session.len()
    }

    /// Applies one command. On error the state is exactly as it was.
    pub fn apply(
        &mut self,
        session: &ReplaySession,
        command: &ReplayCommand,
    ) -> Result<(), ReplayError> {
        self.check_session(session)?;

        match command.command {
            CommandKind::Play => {
                if session.is_empty() {
                    debug!(session = %self.session_id, "play ignored on empty session");
                } else {
                    self.is_playing = true;
                }
            }
            CommandKind::Pause => self.is_playing = false,
            CommandKind::StepForward => {
                if self.current_index + 1 < session.len() {
                    self.move_to(session, self.current_index + 1);
                } else {
                    debug!(index = self.current_index, "step_forward at last event");
                }
            }
            CommandKind::StepBack => {
                if self.current_index > 0 {
                    self.move_to(session, self.current_index - 1);
                } else {
                    debug!("step_back at first event");
                }
            }
            CommandKind::Seek => {
                let index = parse_index(command, session)?;
                self.move_to(session, index);
            }
            CommandKind::SetRate => {
                let raw = require_value(command)?;
                let rate = raw
                    .parse::<f64>()
                    .map_err(|e| invalid(command, format!("{raw:?} is not a number: {e}")))
                    .and_then(|rate| {
                        validate_rate(rate).map_err(|e| invalid(command, e.to_string()))
                    })?;
                self.playback_rate = rate;
            }
        }

        trace!(
            %command,
            index = self.current_index,
            playing = self.is_playing,
            rate = self.playback_rate,
            "command applied"
        );
        Ok(())
    }

    /// Advances one event while playing; the driver's clock loop calls this.
    ///
    /// Advancing from the last event parks the cursor on the end sentinel and
    /// pauses. Returns the event that became current.
    pub fn tick<'s>(
        &mut self,
        session: &'s ReplaySession,
    ) -> Result<Option<&'s EventRecord>, ReplayError> {
        self.check_session(session)?;

        if !self.is_playing {
            return Ok(None);
        }
        if self.current_index + 1 < session.len() {
            self.move_to(session, self.current_index + 1);
            return Ok(self.current_event(session));
        }

        self.move_to(session, session.len());
        self.is_playing = false;
        debug!(session = %self.session_id, "playback reached end");
        Ok(None)
    }

    /// Wall-clock wait before the next event at the current rate.
    ///
    /// `None` when there is no next event. Out-of-order timestamps wait zero,
    /// and long gaps or very slow rates are capped at [`MAX_EVENT_DELAY`].
    pub fn delay_to_next(&self, session: &ReplaySession) -> Option<Duration> {
        let current = session.get_event(self.current_index)?;
        let next = session.get_event(self.current_index + 1)?;
        let gap_ms = next.timestamp.saturating_sub(current.timestamp).max(0);
        #[allow(clippy::cast_precision_loss)]
        let scaled = gap_ms as f64 / self.playback_rate;
        let delay = Duration::try_from_secs_f64(scaled / 1000.0).unwrap_or(MAX_EVENT_DELAY);
        Some(delay.min(MAX_EVENT_DELAY))
    }

    fn check_session(&self, session: &ReplaySession) -> Result<(), ReplayError> {
        if session.id() == self.session_id {
            Ok(())
        } else {
            Err(ReplayError::SessionMismatch {
                expected: self.session_id.clone(),
                found: session.id().to_string(),
            })
        }
    }

    /// Moves the cursor and refreshes the denormalized timestamp.
    fn move_to(&mut self, session: &ReplaySession, index: usize) {
        self.current_index = index.min(session.len());
        self.current_timestamp = session
            .get_event(self.current_index)
            .map_or(session.end_time(), |e| e.timestamp);
    }
}

fn validate_rate(rate: f64) -> Result<f64, ReplayError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(ReplayError::InvalidRate(rate))
    }
}

fn require_value(command: &ReplayCommand) -> Result<&str, ReplayError> {
    command
        .value
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| invalid(command, "missing value".into()))
}

fn parse_index(command: &ReplayCommand, session: &ReplaySession) -> Result<usize, ReplayError> {
    let raw = require_value(command)?;
    let index = raw
        .parse::<usize>()
        .map_err(|e| invalid(command, format!("{raw:?} is not an event index: {e}")))?;
    if index >= session.len() {
        return Err(invalid(
            command,
            format!("index {index} out of range for {} events", session.len()),
        ));
    }
    Ok(index)
}

fn invalid(command: &ReplayCommand, reason: String) -> ReplayError {
    ReplayError::InvalidCommand {
        command: command.command,
        reason,
    }
}
