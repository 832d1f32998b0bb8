//! Session arena (`spec.md` §3, §4.1, §4.4).
//!
//! The original allocates session contexts from a generic heap
//! (`se3_mem_alloc`) and tracks algorithm id in a parallel
//! `sessions_algo[]` array indexed by the same handle. Fixed capacity
//! and a closed context type let this collapse into one array of
//! optional slots, each either empty or holding a self-describing
//! [`AlgoContext`] — no separate algo-id table needed, [`AlgoContext::kind`]
//! already knows.

use zeroize::Zeroize;

use crate::algo::{self, AlgoContext, AlgoError, AlgoKind};
use crate::consts::SESSIONS_MAX;
use crate::flags::CmdFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    ArenaFull,
    NotFound,
    Algo(AlgoError),
}

impl From<AlgoError> for SessionError {
    fn from(e: AlgoError) -> Self {
        SessionError::Algo(e)
    }
}

pub struct SessionArena {
    slots: [Option<AlgoContext>; SESSIONS_MAX],
}

impl SessionArena {
    pub const fn new() -> Self {
        const EMPTY: Option<AlgoContext> = None;
        Self {
            slots: [EMPTY; SESSIONS_MAX],
        }
    }

    /// Create a new session, returning its handle. `spec.md` §4.4.1:
    /// handles are dense array indices, not reused across a reallocation
    /// of the same slot in a way that would confuse a stale caller — the
    /// original has the same property by construction (a freed slot's
    /// memory is simply available again).
    pub fn allocate(&mut self, kind: AlgoKind, key: &[u8], mode: u16) -> Result<u32, SessionError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SessionError::ArenaFull)?;
        let ctx = algo::init(kind, key, mode)?;
        self.slots[index] = Some(ctx);
        Ok(index as u32)
    }

    pub fn kind(&self, handle: u32) -> Result<AlgoKind, SessionError> {
        self.slot(handle).map(AlgoContext::kind)
    }

    fn slot(&self, handle: u32) -> Result<&AlgoContext, SessionError> {
        self.slots
            .get(handle as usize)
            .and_then(Option::as_ref)
            .ok_or(SessionError::NotFound)
    }

    fn slot_mut(&mut self, handle: u32) -> Result<&mut AlgoContext, SessionError> {
        self.slots
            .get_mut(handle as usize)
            .and_then(Option::as_mut)
            .ok_or(SessionError::NotFound)
    }

    /// Feed one `crypto_update` call's worth of data through the session
    /// named by `handle`. If `flags` carries `FINIT` and the call
    /// succeeded, the session is freed (and its context zeroized)
    /// afterward. A failed call leaves the session open so the caller can
    /// retry or close it explicitly, matching the original returning
    /// before its `SE3_CRYPTO_FLAG_FINIT` free on a non-`SE3_OK` status.
    pub fn update(
        &mut self,
        handle: u32,
        flags: CmdFlags,
        datain1: &[u8],
        datain2: &[u8],
        dataout: &mut [u8],
    ) -> Result<usize, SessionError> {
        let result = {
            let ctx = self.slot_mut(handle)?;
            algo::update(ctx, flags, datain1, datain2, dataout).map_err(SessionError::Algo)
        };
        if result.is_ok() && flags.contains(CmdFlags::FINIT) {
            self.free(handle);
        }
        result
    }

    /// Drop and zeroize a session's context, freeing its slot. No-op if
    /// the handle is already empty.
    pub fn free(&mut self, handle: u32) {
        if let Some(slot) = self.slots.get_mut(handle as usize) {
            if let Some(ctx) = slot {
                ctx.zeroize();
            }
            *slot = None;
        }
    }
}

impl Default for SessionArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::aes;

    #[test]
    fn allocate_runs_out_after_sessions_max() {
        let mut arena = SessionArena::new();
        for _ in 0..SESSIONS_MAX {
            arena.allocate(AlgoKind::Sha256, &[], 0).unwrap();
        }
        assert_eq!(
            arena.allocate(AlgoKind::Sha256, &[], 0).unwrap_err(),
            SessionError::ArenaFull
        );
    }

    #[test]
    fn finit_frees_the_slot_for_reuse() {
        let mut arena = SessionArena::new();
        let h = arena.allocate(AlgoKind::Sha256, &[], 0).unwrap();
        let mut out = [0u8; 32];
        arena.update(h, CmdFlags::FINIT, b"x", &[], &mut out).unwrap();
        assert_eq!(arena.kind(h).unwrap_err(), SessionError::NotFound);

        // The slot is available again.
        for _ in 0..SESSIONS_MAX {
            arena.allocate(AlgoKind::Sha256, &[], 0).unwrap();
        }
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let arena = SessionArena::new();
        assert_eq!(arena.kind(0).unwrap_err(), SessionError::NotFound);
    }

    #[test]
    fn finit_does_not_free_the_slot_when_the_update_call_fails() {
        let mut arena = SessionArena::new();
        let h = arena.allocate(AlgoKind::Aes, &[0u8; aes::KEY_SIZE as usize], 0).unwrap();
        let mut out = [0u8; 1];
        // Input not a multiple of the block size: the call errors, so the
        // session stays open for the caller to retry or close explicitly.
        assert!(arena.update(h, CmdFlags::FINIT, &[0u8; 3], &[], &mut out).is_err());
        assert_eq!(arena.kind(h).unwrap(), AlgoKind::Aes);
    }
}
