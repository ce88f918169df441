//! Stream metrics
//!
//! Counters are recorded through the `metrics` facade. The library installs no
//! recorder; without one every call is a no-op.

/// Describe all counters (call once after installing a recorder)
pub fn describe_metrics() {
    metrics::describe_counter!(
        "assistant_stream_sessions_total",
        "Total number of stream sessions started"
    );
    metrics::describe_counter!(
        "assistant_stream_session_outcomes_total",
        "Stream sessions by terminal outcome"
    );
    metrics::describe_counter!(
        "assistant_stream_dropped_frames_total",
        "Frames dropped because their payload could not be parsed"
    );
    metrics::describe_counter!(
        "assistant_stream_events_total",
        "Events delivered to callers"
    );
}

/// Terminal outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Complete,
    Error,
    Aborted,
}

impl SessionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionOutcome::Complete => "complete",
            SessionOutcome::Error => "error",
            SessionOutcome::Aborted => "aborted",
        }
    }
}

/// Record a session start
pub fn record_session_started(transport: &str) {
    metrics::counter!("assistant_stream_sessions_total", "transport" => transport.to_string())
        .increment(1);
}

/// Record how a session ended
pub fn record_session_outcome(outcome: SessionOutcome) {
    metrics::counter!(
        "assistant_stream_session_outcomes_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a frame dropped on a soft parse failure
pub fn record_dropped_frame(event: &str, reason: &'static str) {
    metrics::counter!(
        "assistant_stream_dropped_frames_total",
        "event" => event.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record an event handed to the caller
pub fn record_event(kind: &'static str) {
    metrics::counter!("assistant_stream_events_total", "event" => kind).increment(1);
}
