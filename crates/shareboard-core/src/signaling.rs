//! Signaling collaborator.
//!
//! Bootstraps the peer connection by exchanging session-description and ICE
//! candidate documents between two named peers through a shared document
//! store. The core never interprets the SDP or candidate payloads; it drives
//! the document exchange and hands the host back enough to finish the
//! handshake, after which the core only sees a connected transport.

use crate::identity::UserIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("no room hosted by {0}")]
    RoomNotFound(String),
    #[error("signaling store error: {0}")]
    Store(String),
}

/// Which half of the handshake a description belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// An opaque session description produced by the host's RTC stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

/// An opaque ICE candidate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u32>,
}

/// Which side's candidate list a candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateSide {
    Offer,
    Answer,
}

/// Room document as held by the signaling backend, keyed by the host's uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    pub created_at: DateTime<Utc>,
    pub offer: SessionDescription,
    pub answer: Option<SessionDescription>,
}

/// Shared document store the two peers exchange handshake data through.
pub trait SignalingStore {
    /// Create (or overwrite) the room hosted by `host`.
    fn create_room(&mut self, host: &str, room: RoomDocument) -> Result<(), SignalingError>;

    fn room(&self, host: &str) -> Result<Option<RoomDocument>, SignalingError>;

    fn set_answer(
        &mut self,
        host: &str,
        answer: SessionDescription,
    ) -> Result<(), SignalingError>;

    fn push_candidate(
        &mut self,
        host: &str,
        side: CandidateSide,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError>;

    fn candidates(&self, host: &str, side: CandidateSide)
    -> Result<Vec<IceCandidate>, SignalingError>;

    fn clear_candidates(&mut self, host: &str, side: CandidateSide) -> Result<(), SignalingError>;

    fn delete_room(&mut self, host: &str) -> Result<(), SignalingError>;
}

/// In-memory store for tests and single-process sessions.
#[derive(Debug, Default)]
pub struct MemorySignalingStore {
    rooms: HashMap<String, RoomDocument>,
    candidates: HashMap<(String, CandidateSide), Vec<IceCandidate>>,
}

impl MemorySignalingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalingStore for MemorySignalingStore {
    fn create_room(&mut self, host: &str, room: RoomDocument) -> Result<(), SignalingError> {
        self.rooms.insert(host.to_string(), room);
        Ok(())
    }

    fn room(&self, host: &str) -> Result<Option<RoomDocument>, SignalingError> {
        Ok(self.rooms.get(host).cloned())
    }

    fn set_answer(
        &mut self,
        host: &str,
        answer: SessionDescription,
    ) -> Result<(), SignalingError> {
        let room = self
            .rooms
            .get_mut(host)
            .ok_or_else(|| SignalingError::RoomNotFound(host.to_string()))?;
        room.answer = Some(answer);
        Ok(())
    }

    fn push_candidate(
        &mut self,
        host: &str,
        side: CandidateSide,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        self.candidates
            .entry((host.to_string(), side))
            .or_default()
            .push(candidate);
        Ok(())
    }

    fn candidates(
        &self,
        host: &str,
        side: CandidateSide,
    ) -> Result<Vec<IceCandidate>, SignalingError> {
        Ok(self
            .candidates
            .get(&(host.to_string(), side))
            .cloned()
            .unwrap_or_default())
    }

    fn clear_candidates(&mut self, host: &str, side: CandidateSide) -> Result<(), SignalingError> {
        self.candidates.remove(&(host.to_string(), side));
        Ok(())
    }

    fn delete_room(&mut self, host: &str) -> Result<(), SignalingError> {
        self.rooms.remove(host);
        self.candidates.retain(|(h, _), _| h != host);
        Ok(())
    }
}

/// Role this peer took in the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Host,
    Guest,
}

/// Lifecycle of one call: start or join, exchange candidates, hang up.
///
/// Teardown releases every handler the host registered on the peer
/// connection and is safe to repeat; it also runs on drop, so an abandoned
/// session cannot fire callbacks into torn-down state.
#[derive(Default)]
pub struct CallSession {
    role: Option<CallRole>,
    room_id: Option<String>,
    /// Cleanup hooks for handlers registered with the host RTC stack.
    teardowns: Vec<Box<dyn FnOnce() + Send>>,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<CallRole> {
        self.role
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.role.is_some()
    }

    /// Host side: publish an offer room keyed by the signed-in uid. Returns
    /// the room id the guest should join with.
    pub fn start_call<S: SignalingStore>(
        &mut self,
        user: Option<&UserIdentity>,
        store: &mut S,
        offer: SessionDescription,
    ) -> Result<String, SignalingError> {
        let user = user.ok_or(SignalingError::NotSignedIn)?;
        // Candidates from a previous call must not leak into this one.
        store.clear_candidates(&user.uid, CandidateSide::Offer)?;
        store.clear_candidates(&user.uid, CandidateSide::Answer)?;
        store.create_room(
            &user.uid,
            RoomDocument {
                created_at: Utc::now(),
                offer,
                answer: None,
            },
        )?;
        self.role = Some(CallRole::Host);
        self.room_id = Some(user.uid.clone());
        log::info!("hosting call in room {}", user.uid);
        Ok(user.uid.clone())
    }

    /// Guest side: answer the room hosted by `host`. Returns `Ok(false)`
    /// when no such room exists — an absent room is not an error, the host
    /// simply has not started a call.
    pub fn join_call<S: SignalingStore>(
        &mut self,
        user: Option<&UserIdentity>,
        store: &mut S,
        host: &str,
        answer: SessionDescription,
    ) -> Result<bool, SignalingError> {
        user.ok_or(SignalingError::NotSignedIn)?;
        if store.room(host)?.is_none() {
            return Ok(false);
        }
        store.set_answer(host, answer)?;
        self.role = Some(CallRole::Guest);
        self.room_id = Some(host.to_string());
        log::info!("joined call in room {host}");
        Ok(true)
    }

    /// The host's view of the guest's answer, once one lands in the store.
    pub fn poll_answer<S: SignalingStore>(
        &self,
        store: &S,
    ) -> Result<Option<SessionDescription>, SignalingError> {
        match (self.role, &self.room_id) {
            (Some(CallRole::Host), Some(room)) => Ok(store.room(room)?.and_then(|r| r.answer)),
            _ => Ok(None),
        }
    }

    /// Publish a local ICE candidate on this peer's side of the room.
    pub fn publish_candidate<S: SignalingStore>(
        &self,
        store: &mut S,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        let (side, room) = match (self.role, &self.room_id) {
            (Some(CallRole::Host), Some(room)) => (CandidateSide::Offer, room),
            (Some(CallRole::Guest), Some(room)) => (CandidateSide::Answer, room),
            _ => return Err(SignalingError::Store("no active call".to_string())),
        };
        store.push_candidate(room, side, candidate)
    }

    /// Candidates published by the remote peer.
    pub fn remote_candidates<S: SignalingStore>(
        &self,
        store: &S,
    ) -> Result<Vec<IceCandidate>, SignalingError> {
        match (self.role, &self.room_id) {
            (Some(CallRole::Host), Some(room)) => store.candidates(room, CandidateSide::Answer),
            (Some(CallRole::Guest), Some(room)) => store.candidates(room, CandidateSide::Offer),
            _ => Ok(Vec::new()),
        }
    }

    /// Register cleanup for a handler installed on the peer connection; it
    /// runs exactly once, at hang-up.
    pub fn on_teardown(&mut self, release: impl FnOnce() + Send + 'static) {
        self.teardowns.push(Box::new(release));
    }

    /// Release every registered handler and forget the room. Idempotent:
    /// calling it on an already-ended call does nothing.
    pub fn hang_up(&mut self) {
        for release in self.teardowns.drain(..) {
            release();
        }
        if self.role.take().is_some() {
            log::info!("call ended");
        }
        self.room_id = None;
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        self.hang_up();
    }
}
