//! Dispatch entry point (`spec.md` §5, `SPEC_FULL.md` §1 "Crate shape").
//!
//! `Engine` gathers the module-level state the original keeps as
//! globals (`spec.md` §9: "gather globals into a single context struct
//! threaded through the dispatcher") — the session arena, device-time
//! authority, flash handle, and optional payload channel — into one
//! struct with no internal locking, matching the single-threaded
//! cooperative dispatch model of §5.

use crate::error::StatusCode;
use crate::flash::FlashDevice;
use crate::handlers;
use crate::payload::PayloadContext;
use crate::session::SessionArena;
use crate::time::DeviceTime;

/// The crypto command subset this engine dispatches (`SPEC_FULL.md` §6);
/// everything else is the transport layer's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CryptoInit,
    CryptoUpdate,
    CryptoSetTime,
    CryptoList,
}

pub struct Engine<F: FlashDevice> {
    flash: F,
    arena: SessionArena,
    time: DeviceTime,
    payload: Option<PayloadContext>,
    authenticated: bool,
}

impl<F: FlashDevice> Engine<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            arena: SessionArena::new(),
            time: DeviceTime::new(),
            payload: None,
            authenticated: true,
        }
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Gate every handler behind a login check. Not wired to any login
    /// subsystem here (`SPEC_FULL.md` §4.4) — defaults to `true`, set to
    /// `false` by an embedding product that implements its own gate.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    /// Derive the payload channel from a base key (`spec.md` §4.5).
    /// Replaces any previously derived channel.
    pub fn payload_crypto_init(&mut self, base_key: &[u8]) {
        self.payload = Some(PayloadContext::new(base_key));
    }

    pub fn payload(&self) -> Option<&PayloadContext> {
        self.payload.as_ref()
    }

    /// Run one command against `req`, writing its response into `resp`
    /// and returning the number of bytes written.
    pub fn dispatch(&mut self, command: Command, req: &[u8], resp: &mut [u8]) -> Result<usize, StatusCode> {
        match command {
            Command::CryptoInit => {
                handlers::crypto_init(&mut self.arena, &self.flash, &self.time, self.authenticated, req, resp)
            }
            Command::CryptoUpdate => handlers::crypto_update(&mut self.arena, self.authenticated, req, resp),
            Command::CryptoSetTime => {
                handlers::crypto_set_time(&mut self.time, self.authenticated, req)?;
                Ok(0)
            }
            Command::CryptoList => handlers::crypto_list(self.authenticated, resp),
        }
    }
}
