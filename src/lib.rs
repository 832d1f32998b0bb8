//! Security command dispatch and session engine for a USB-attached
//! secure cryptographic token.
//!
//! Enumerates algorithms, opens and drives per-session cipher/MAC
//! contexts backed by keys read from persistent flash storage, and
//! separately wraps every host↔device payload in an authenticated
//! encryption envelope. The USB/serial framing layer, bootloader, flash
//! physical driver, and login/authentication state are out of scope —
//! this crate exposes [`Engine::dispatch`] for a transport layer to call.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::indexing_slicing))]

pub mod algo;
pub mod consts;
pub mod engine;
pub mod error;
pub mod flags;
pub mod flash;
pub mod handlers;
pub mod key;
pub mod payload;
pub mod record;
pub mod session;
pub mod time;
pub mod wire;

pub use engine::{Command, Engine};
pub use error::StatusCode;
pub use flash::FlashDevice;
