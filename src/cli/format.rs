//! Output formatting for CLI display.

use logreplay::{EventRecord, ReplaySession, ReplayState};

/// Format a millisecond offset as signed seconds, e.g. `+1.250s`.
pub(super) fn format_offset(ms: i64) -> String {
    let sign = if ms < 0 { '-' } else { '+' };
    let abs = ms.unsigned_abs();
    format!("{sign}{}.{:03}s", abs / 1000, abs % 1000)
}

/// One event per line: index, offset from session start, summary.
pub(super) fn format_event_line(index: usize, event: &EventRecord, start: i64) -> String {
    let offset = format_offset(event.timestamp.wrapping_sub(start));
    let summary = event.summary();
    if summary.is_empty() {
        format!("#{index:<5} {offset}")
    } else {
        format!("#{index:<5} {offset}  {summary}")
    }
}

/// Cursor position, relative time, mode, and rate.
pub(super) fn format_state(state: &ReplayState, session: &ReplaySession) -> String {
    let position = if state.is_at_end(session) {
        "end".to_string()
    } else {
        state.current_index().to_string()
    };
    let mode = if state.is_playing() { "playing" } else { "paused" };
    format!(
        "{position}/{}  {}  {mode}  x{}",
        session.len(),
        format_offset(state.relative_time()),
        state.playback_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use logreplay::ReplayCommand;

    #[test]
    fn format_offsets() {
        let cases = [
            (0, "+0.000s"),
            (1_250, "+1.250s"),
            (-40, "-0.040s"),
            (61_005, "+61.005s"),
        ];
        for (ms, expected) in cases {
            assert_eq!(format_offset(ms), expected);
        }
    }

    #[test]
    fn format_event_with_summary() {
        let event = EventRecord {
            event_type: Some("delete".into()),
            message: Some("gc".into()),
            ..EventRecord::at(1_500)
        };
        assert_eq!(
            format_event_line(2, &event, 1_000),
            "#2     +0.500s  [delete] gc"
        );
    }

    #[test]
    fn format_event_far_from_start() {
        let line = format_event_line(1, &EventRecord::at(i64::MAX), i64::MIN);
        assert_eq!(line, "#1     -0.001s");
    }

    #[test]
    fn format_bare_event() {
        assert_eq!(format_event_line(0, &EventRecord::at(7), 7), "#0     +0.000s");
    }

    #[test]
    fn format_paused_and_playing_state() {
        let session = ReplaySession::new(
            "t.log",
            vec![EventRecord::at(100), EventRecord::at(350)],
        );
        let mut state = ReplayState::new(&session);
        assert_eq!(format_state(&state, &session), "0/2  +0.000s  paused  x1");

        state.apply(&session, &ReplayCommand::step_forward()).unwrap();
        state.apply(&session, &ReplayCommand::play()).unwrap();
        assert_eq!(format_state(&state, &session), "1/2  +0.250s  playing  x1");
    }

    #[test]
    fn format_state_at_end() {
        let session = ReplaySession::new("t.log", vec![]);
        let state = ReplayState::new(&session);
        assert_eq!(format_state(&state, &session), "end/0  +0.000s  paused  x1");
    }
}
