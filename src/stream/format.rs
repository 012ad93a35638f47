//! Framing of stream events for a byte-oriented transport

use crate::stream::StreamEvent;
use serde_json::json;

/// How events are written to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamFormat {
    /// Server-sent events: `id:`/`event:`/`retry:`/`data:` lines and a blank line
    #[default]
    Sse,

    /// One JSON object per line
    Json,
}

impl StreamFormat {
    /// Renders one event as a complete frame, including its terminator
    pub fn frame(&self, event: &StreamEvent) -> String {
        match self {
            Self::Sse => sse_frame(event),
            Self::Json => json_line(event),
        }
    }
}

fn sse_frame(event: &StreamEvent) -> String {
    let mut frame = format!(
        "id: {}\nevent: {}\nretry: {}\n",
        event.id, event.event, event.retry
    );
    // A data field may not contain raw newlines; split it over several lines
    for line in event.data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

fn json_line(event: &StreamEvent) -> String {
    let line = json!({
        "id": event.id,
        "event": event.event.as_str(),
        "data": event.data_json(),
    });
    format!("{}\n", line)
}
