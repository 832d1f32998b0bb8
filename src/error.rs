//! Wire status codes returned by every command handler.
//!
//! Mirrors the `SE3_ERR_*`/`SE3_OK` taxonomy of the original firmware:
//! handlers never unwind, they return one of these codes synchronously
//! and the transport re-wraps it into a response frame (`spec.md` §6).

use num_derive::{FromPrimitive, ToPrimitive};

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum StatusCode {
    Ok = 0,
    ErrParams = 1,
    ErrAccess = 2,
    ErrResource = 3,
    ErrMemory = 4,
    ErrExpired = 5,
    ErrHw = 6,
}

impl core::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            StatusCode::Ok => "ok",
            StatusCode::ErrParams => "bad parameters",
            StatusCode::ErrAccess => "access denied",
            StatusCode::ErrResource => "resource not found",
            StatusCode::ErrMemory => "out of memory",
            StatusCode::ErrExpired => "key expired",
            StatusCode::ErrHw => "hardware failure",
        };
        f.write_str(s)
    }
}

pub type Result<T> = core::result::Result<T, StatusCode>;

impl From<crate::algo::AlgoError> for StatusCode {
    /// Primitive failures propagate as `ErrParams`: every [`AlgoError`]
    /// variant traces back to a malformed call (bad key/input/output
    /// length, a `FINIT` required but missing, a mismatched tag) rather
    /// than a hardware fault.
    fn from(e: crate::algo::AlgoError) -> Self {
        use crate::algo::AlgoError;
        match e {
            AlgoError::BadKeyLength
            | AlgoError::BadInputLength
            | AlgoError::BadOutputLength
            | AlgoError::NotYetFinalized
            | AlgoError::TagMismatch => StatusCode::ErrParams,
        }
    }
}

impl From<crate::session::SessionError> for StatusCode {
    fn from(e: crate::session::SessionError) -> Self {
        use crate::session::SessionError;
        match e {
            SessionError::ArenaFull => StatusCode::ErrMemory,
            SessionError::NotFound => StatusCode::ErrResource,
            SessionError::Algo(e) => e.into(),
        }
    }
}
