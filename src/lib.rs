//! Replay recorded event logs like a media player.
//!
//! A JSONL log is read once into a [`ReplaySession`], an immutable timeline
//! with time-range and index queries. A [`ReplayState`] cursor then moves
//! through that timeline in response to [`ReplayCommand`]s.
//!
//! ```no_run
//! use logreplay::{ReplayCommand, ReplaySession, ReplayState};
//!
//! let session = ReplaySession::load("ops.log")?;
//! let mut state = ReplayState::new(&session);
//! state.apply(&session, &ReplayCommand::seek("3"))?;
//! println!("at {}ms", state.relative_time());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod id;
pub mod ingest;
pub mod model;
pub mod replay;
pub mod session;

pub use ingest::{IngestError, read_log};
pub use model::{BlockId, EventRecord};
pub use replay::{CommandKind, ReplayCommand, ReplayError, ReplayState};
pub use session::ReplaySession;
