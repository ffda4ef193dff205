//! WebRTC signaling relay for interview video calls: pairs one HR socket and
//! one candidate socket per application ID, forwarding SDP offers/answers
//! and ICE candidates and buffering for whichever side connects late. Media
//! never touches this process.

pub mod protocol;
pub mod router;
pub mod session;

pub use protocol::SignalMessage;
pub use router::{signaling_router, SignalingState};
pub use session::{fallback_meeting_url, PeerRole, PeerSender, SessionRegistry};
