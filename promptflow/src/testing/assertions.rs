//! Test assertions for relayed event streams.

use super::ParsedFrame;

/// Asserts the stream has exactly the given kinds, in order.
pub fn assert_event_kinds(frames: &[ParsedFrame], expected: &[&str]) {
    let actual: Vec<&str> = frames.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(actual, expected, "Unexpected event sequence");
}

/// Asserts the stream follows `ready, progress*, (final | error)?, done`.
pub fn assert_well_formed(frames: &[ParsedFrame]) {
    let kinds: Vec<&str> = frames.iter().map(|f| f.kind.as_str()).collect();

    assert_eq!(kinds.first(), Some(&"ready"), "Stream must open with ready: {kinds:?}");
    assert_eq!(kinds.last(), Some(&"done"), "Stream must end with done: {kinds:?}");
    assert_eq!(
        kinds.iter().filter(|k| **k == "done").count(),
        1,
        "Expected exactly one done: {kinds:?}"
    );
    assert_eq!(
        kinds.iter().filter(|k| **k == "ready").count(),
        1,
        "Expected exactly one ready: {kinds:?}"
    );

    let outcomes = kinds
        .iter()
        .filter(|k| **k == "final" || **k == "error")
        .count();
    assert!(outcomes <= 1, "At most one of final/error is allowed: {kinds:?}");

    let middle = &kinds[1..kinds.len() - 1];
    let first_outcome = middle
        .iter()
        .position(|k| *k == "final" || *k == "error")
        .unwrap_or(middle.len());
    assert!(
        middle[..first_outcome].iter().all(|k| *k == "progress"),
        "Only progress may precede final/error: {kinds:?}"
    );
    assert!(
        first_outcome + 1 >= middle.len(),
        "Nothing may follow final/error except done: {kinds:?}"
    );
}

/// Asserts the run succeeded: a `final` event is present and no `error`.
pub fn assert_completed(frames: &[ParsedFrame]) {
    assert!(
        frames.iter().any(|f| f.kind == "final"),
        "Expected a final event, got {:?}",
        frames.iter().map(|f| &f.kind).collect::<Vec<_>>()
    );
    assert!(!frames.iter().any(|f| f.kind == "error"), "Unexpected error event");
}

/// Asserts the run failed with the given message, and no `final` was sent.
pub fn assert_failed_with(frames: &[ParsedFrame], message: &str) {
    let error = frames
        .iter()
        .find(|f| f.kind == "error")
        .unwrap_or_else(|| panic!("Expected an error event"));
    assert_eq!(error.data["message"], message, "Unexpected error message");
    assert!(!frames.iter().any(|f| f.kind == "final"), "final must not follow a failure");
}
