use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON text frames exchanged with browser peers. SDP and ICE payloads are
/// opaque to the relay; they are forwarded (or buffered) verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalMessage {
    /// SDP offer, HR to candidate.
    Offer { offer: Value },
    /// SDP answer, candidate to HR.
    Answer { answer: Value },
    /// ICE candidate, either direction.
    Ice { ice: Value },
    /// Keepalive; carries no payload and is ignored by relay logic.
    Ping,
    /// Relay-originated: the HR peer came online.
    HrOnline,
    /// Relay-originated: the candidate peer came online.
    CandidateOnline,
    /// Relay-originated: both peers should move to a fallback meeting.
    Fallback { url: String },
}
