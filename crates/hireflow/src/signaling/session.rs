//! Per-application signaling sessions. Each session pairs at most one HR
//! peer with one candidate peer, buffering negotiation messages for
//! whichever side has not connected yet. Sessions with no connected peer are
//! evicted after an idle timeout instead of accumulating for the process
//! lifetime.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::protocol::SignalMessage;

/// Which side of the call a connection represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Hr,
    Candidate,
}

impl PeerRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::Candidate => "candidate",
        }
    }

    const fn online_notice(self) -> SignalMessage {
        match self {
            Self::Hr => SignalMessage::HrOnline,
            Self::Candidate => SignalMessage::CandidateOnline,
        }
    }
}

/// Handle the relay uses to push messages toward one peer. The WebSocket
/// task on the other end drains this into the socket, which keeps the relay
/// core free of socket I/O.
pub type PeerSender = mpsc::UnboundedSender<SignalMessage>;

#[derive(Default)]
struct Session {
    hr: Option<PeerSender>,
    candidate: Option<PeerSender>,
    pending_offer: Option<Value>,
    pending_answer: Option<Value>,
    ice_for_candidate: Vec<Value>,
    ice_for_hr: Vec<Value>,
    last_activity: Option<Instant>,
}

impl Session {
    fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }

    fn peer_of(&mut self, role: PeerRole) -> &mut Option<PeerSender> {
        match role {
            PeerRole::Hr => &mut self.candidate,
            PeerRole::Candidate => &mut self.hr,
        }
    }

    fn slot_of(&mut self, role: PeerRole) -> &mut Option<PeerSender> {
        match role {
            PeerRole::Hr => &mut self.hr,
            PeerRole::Candidate => &mut self.candidate,
        }
    }

    fn has_peer(&self) -> bool {
        self.hr.is_some() || self.candidate.is_some()
    }

    /// Send toward a slot, dropping the sender if the receiving task is
    /// gone. Failures never propagate; the peer is simply treated as
    /// disconnected.
    fn send_to(slot: &mut Option<PeerSender>, message: SignalMessage) -> bool {
        match slot {
            Some(sender) => {
                if sender.send(message).is_ok() {
                    true
                } else {
                    debug!("peer channel closed; dropping stale sender");
                    *slot = None;
                    false
                }
            }
            None => false,
        }
    }
}

/// Registry of live signaling sessions keyed by application ID.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connecting peer: notify the other side it is online, then
    /// flush everything buffered for this side. Buffered items are taken,
    /// not copied, so each is delivered at most once.
    pub fn connect(&self, application_id: &str, role: PeerRole, sender: PeerSender) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions.entry(application_id.to_string()).or_default();
        session.touch();
        *session.slot_of(role) = Some(sender);

        Session::send_to(session.peer_of(role), role.online_notice());

        match role {
            PeerRole::Candidate => {
                if let Some(offer) = session.pending_offer.take() {
                    Session::send_to(&mut session.candidate, SignalMessage::Offer { offer });
                }
                for ice in std::mem::take(&mut session.ice_for_candidate) {
                    Session::send_to(&mut session.candidate, SignalMessage::Ice { ice });
                }
            }
            PeerRole::Hr => {
                if let Some(answer) = session.pending_answer.take() {
                    Session::send_to(&mut session.hr, SignalMessage::Answer { answer });
                }
                for ice in std::mem::take(&mut session.ice_for_hr) {
                    Session::send_to(&mut session.hr, SignalMessage::Ice { ice });
                }
            }
        }

        info!(application_id, role = role.label(), "peer connected");
    }

    /// Route one inbound message from `role`. Offers and answers replace any
    /// previously buffered copy; ICE candidates are always appended to the
    /// directional buffer (so a reconnecting peer can catch up on all prior
    /// candidates) in addition to live forwarding.
    pub fn handle_message(&self, application_id: &str, role: PeerRole, message: SignalMessage) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions.entry(application_id.to_string()).or_default();
        session.touch();

        match (role, message) {
            (PeerRole::Hr, SignalMessage::Offer { offer }) => {
                if !Session::send_to(
                    &mut session.candidate,
                    SignalMessage::Offer {
                        offer: offer.clone(),
                    },
                ) {
                    debug!(application_id, "offer buffered pending candidate");
                    session.pending_offer = Some(offer);
                }
            }
            (PeerRole::Candidate, SignalMessage::Answer { answer }) => {
                if !Session::send_to(
                    &mut session.hr,
                    SignalMessage::Answer {
                        answer: answer.clone(),
                    },
                ) {
                    debug!(application_id, "answer buffered pending hr");
                    session.pending_answer = Some(answer);
                }
            }
            (PeerRole::Hr, SignalMessage::Ice { ice }) => {
                session.ice_for_candidate.push(ice.clone());
                Session::send_to(&mut session.candidate, SignalMessage::Ice { ice });
            }
            (PeerRole::Candidate, SignalMessage::Ice { ice }) => {
                session.ice_for_hr.push(ice.clone());
                Session::send_to(&mut session.hr, SignalMessage::Ice { ice });
            }
            (_, SignalMessage::Ping) => {}
            (role, message) => {
                debug!(
                    application_id,
                    role = role.label(),
                    ?message,
                    "ignoring message this role may not send"
                );
            }
        }
    }

    /// Remove one side's registration. The peer is not notified and the
    /// session's buffers survive for a reconnect.
    pub fn disconnect(&self, application_id: &str, role: PeerRole) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if let Some(session) = sessions.get_mut(application_id) {
            *session.slot_of(role) = None;
            session.touch();
            info!(application_id, role = role.label(), "peer disconnected");
        }
    }

    /// Push both connected peers to a generated fallback meeting URL and
    /// return it.
    pub fn trigger_fallback(&self, application_id: &str) -> String {
        let url = fallback_meeting_url();
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if let Some(session) = sessions.get_mut(application_id) {
            session.touch();
            Session::send_to(
                &mut session.hr,
                SignalMessage::Fallback { url: url.clone() },
            );
            Session::send_to(
                &mut session.candidate,
                SignalMessage::Fallback { url: url.clone() },
            );
        }
        info!(application_id, %url, "fallback triggered");
        url
    }

    /// Drop sessions that have had no connected peer for longer than
    /// `max_idle`. Returns how many were evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let before = sessions.len();
        sessions.retain(|application_id, session| {
            if session.has_peer() {
                return true;
            }
            let stale = session
                .last_activity
                .map(|at| at.elapsed() > max_idle)
                .unwrap_or(true);
            if stale {
                debug!(application_id, "evicting idle session");
            }
            !stale
        });
        before - sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("session mutex poisoned").len()
    }

    pub fn is_connected(&self, application_id: &str, role: PeerRole) -> bool {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get_mut(application_id)
            .map(|session| session.slot_of(role).is_some())
            .unwrap_or(false)
    }
}

/// Unique meeting room on the public Jitsi instance, used when peer-to-peer
/// negotiation cannot complete.
pub fn fallback_meeting_url() -> String {
    let room = Uuid::new_v4().simple().to_string();
    format!("https://meet.jit.si/Interview-{}", &room[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn drain(rx: &mut UnboundedReceiver<SignalMessage>) -> Vec<SignalMessage> {
        let mut received = Vec::new();
        while let Ok(message) = rx.try_recv() {
            received.push(message);
        }
        received
    }

    #[test]
    fn offer_before_candidate_is_buffered_then_flushed_once() {
        let registry = SessionRegistry::new();
        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        registry.handle_message(
            "app-1",
            PeerRole::Hr,
            SignalMessage::Offer {
                offer: json!({"sdp": "v=0"}),
            },
        );

        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        let received = drain(&mut cand_rx);
        let offers: Vec<_> = received
            .iter()
            .filter(|message| matches!(message, SignalMessage::Offer { .. }))
            .collect();
        assert_eq!(offers.len(), 1, "exactly one offer delivered");

        // A later reconnect must not replay the consumed offer.
        registry.disconnect("app-1", PeerRole::Candidate);
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);
        assert!(drain(&mut cand_rx)
            .iter()
            .all(|message| !matches!(message, SignalMessage::Offer { .. })));
    }

    #[test]
    fn repeated_offers_replace_the_buffered_copy() {
        let registry = SessionRegistry::new();
        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        for sdp in ["first", "second"] {
            registry.handle_message(
                "app-1",
                PeerRole::Hr,
                SignalMessage::Offer {
                    offer: json!({ "sdp": sdp }),
                },
            );
        }

        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        let offers: Vec<_> = drain(&mut cand_rx)
            .into_iter()
            .filter_map(|message| match message {
                SignalMessage::Offer { offer } => Some(offer),
                _ => None,
            })
            .collect();
        assert_eq!(offers, vec![json!({"sdp": "second"})]);
    }

    #[test]
    fn buffered_ice_is_delivered_in_order() {
        let registry = SessionRegistry::new();
        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        for candidate in ["a", "b", "c"] {
            registry.handle_message(
                "app-1",
                PeerRole::Hr,
                SignalMessage::Ice {
                    ice: json!(candidate),
                },
            );
        }

        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        let ice: Vec<_> = drain(&mut cand_rx)
            .into_iter()
            .filter_map(|message| match message {
                SignalMessage::Ice { ice } => Some(ice),
                _ => None,
            })
            .collect();
        assert_eq!(ice, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn live_ice_is_forwarded_and_retained_for_reconnect() {
        let registry = SessionRegistry::new();
        let (hr_tx, _hr_rx) = unbounded_channel();
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        registry.handle_message(
            "app-1",
            PeerRole::Hr,
            SignalMessage::Ice { ice: json!("X") },
        );
        assert_eq!(
            drain(&mut cand_rx)
                .into_iter()
                .filter(|message| matches!(message, SignalMessage::Ice { .. }))
                .count(),
            1
        );

        // Candidate drops and reconnects: the candidate catches up on the
        // full ICE history.
        registry.disconnect("app-1", PeerRole::Candidate);
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);
        let replayed: Vec<_> = drain(&mut cand_rx)
            .into_iter()
            .filter_map(|message| match message {
                SignalMessage::Ice { ice } => Some(ice),
                _ => None,
            })
            .collect();
        assert_eq!(replayed, vec![json!("X")]);
    }

    #[test]
    fn connecting_peer_notifies_the_other_side() {
        let registry = SessionRegistry::new();
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);

        assert!(drain(&mut cand_rx)
            .iter()
            .any(|message| matches!(message, SignalMessage::HrOnline)));
    }

    #[test]
    fn answer_is_buffered_until_hr_connects() {
        let registry = SessionRegistry::new();
        let (cand_tx, _cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);
        registry.handle_message(
            "app-1",
            PeerRole::Candidate,
            SignalMessage::Answer {
                answer: json!({"sdp": "answer"}),
            },
        );

        let (hr_tx, mut hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        assert!(drain(&mut hr_rx)
            .iter()
            .any(|message| matches!(message, SignalMessage::Answer { .. })));
    }

    #[test]
    fn fallback_reaches_both_connected_peers() {
        let registry = SessionRegistry::new();
        let (hr_tx, mut hr_rx) = unbounded_channel();
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        registry.connect("app-1", PeerRole::Candidate, cand_tx);

        let url = registry.trigger_fallback("app-1");
        assert!(url.starts_with("https://meet.jit.si/Interview-"));

        for rx in [&mut hr_rx, &mut cand_rx] {
            assert!(drain(rx).iter().any(|message| matches!(
                message,
                SignalMessage::Fallback { url: delivered } if delivered == &url
            )));
        }
    }

    #[test]
    fn eviction_spares_sessions_with_a_connected_peer() {
        let registry = SessionRegistry::new();
        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-live", PeerRole::Hr, hr_tx);

        let (cand_tx, _cand_rx) = unbounded_channel();
        registry.connect("app-stale", PeerRole::Candidate, cand_tx);
        registry.disconnect("app-stale", PeerRole::Candidate);

        let evicted = registry.evict_idle(Duration::from_secs(0));
        assert_eq!(evicted, 1);
        assert_eq!(registry.session_count(), 1);
        assert!(registry.is_connected("app-live", PeerRole::Hr));
    }

    #[test]
    fn stale_sender_is_dropped_when_its_task_is_gone() {
        let registry = SessionRegistry::new();
        let (cand_tx, cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);
        drop(cand_rx);

        let (hr_tx, _hr_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Hr, hr_tx);
        registry.handle_message(
            "app-1",
            PeerRole::Hr,
            SignalMessage::Offer {
                offer: json!({"sdp": "v=0"}),
            },
        );

        // The dead candidate sender was discarded and the offer buffered
        // for the next connect.
        assert!(!registry.is_connected("app-1", PeerRole::Candidate));
        let (cand_tx, mut cand_rx) = unbounded_channel();
        registry.connect("app-1", PeerRole::Candidate, cand_tx);
        assert!(drain(&mut cand_rx)
            .iter()
            .any(|message| matches!(message, SignalMessage::Offer { .. })));
    }
}
