//! Capacity constants. These are compile-time sizes, not runtime
//! configuration (`SPEC_FULL.md` §4.8) — the same role the original's
//! `#define`d `SE3_*_MAX` constants play.

/// Number of algorithm registry slots (`spec.md` §3, §4.1).
pub const ALGO_MAX: usize = 8;

/// Number of concurrently live sessions the arena can hold.
pub const SESSIONS_MAX: usize = 16;

/// Maximum raw key material length read from a key entry.
pub const KEY_DATA_MAX: usize = 32;

/// Number of distinct record types the record store can hold.
pub const RECORD_MAX: usize = 32;

/// Fixed payload size of one flash record.
pub const RECORD_SIZE: usize = 64;

/// Maximum size of a `crypto_update` request, header plus both data
/// fields, the transport's frame size limit (`spec.md` §6).
pub const REQ1_MAX_DATA: usize = 2048;

/// Sentinel meaning "no key" for `crypto_init`'s `key_id` field.
pub const KEY_INVALID: u32 = u32::MAX;

/// Sentinel meaning "no session" prior to successful allocation.
pub const SESSION_INVALID: u32 = u32::MAX;
