use std::fmt;

/// Where a relayed chat turn currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    StreamingText,
    AccumulatingToolCalls,
    ExecutingTools,
    StreamingFollowup,
    Done,
    Error,
}

impl RelayPhase {
    /// Move to `next`, logging the transition
    pub fn advance(&mut self, next: RelayPhase) {
        if *self != next {
            tracing::debug!(from = %self, to = %next, "Relay phase changed");
            *self = next;
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayPhase::Done | RelayPhase::Error)
    }
}

impl fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayPhase::StreamingText => "streaming_text",
            RelayPhase::AccumulatingToolCalls => "accumulating_tool_calls",
            RelayPhase::ExecutingTools => "executing_tools",
            RelayPhase::StreamingFollowup => "streaming_followup",
            RelayPhase::Done => "done",
            RelayPhase::Error => "error",
        };
        f.write_str(name)
    }
}
