//! Algorithm registry and session context dispatch (`spec.md` §3, §9).
//!
//! The original keeps a table of function pointers (`B5_algo`) and a
//! session arena of raw bytes sized per entry's `ctx_size`. Neither
//! translates to safe Rust: the context bytes aren't a POD type we could
//! reinterpret without `unsafe`, and a vtable of raw pointers has no
//! static guarantee the right function runs over the right bytes. A
//! closed, tagged enum gives the same dispatch with the compiler
//! checking it — the same shape `ServerImpl`'s `SessionContext` enum
//! uses to hold one of several hash/HMAC states.

pub mod aes;
pub mod aes256_hmac_sha256;
pub mod aes_hmac_sha256s;
pub mod hmac_sha256;
pub mod sha256;

use crate::consts::ALGO_MAX;
use crate::flags::CmdFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoError {
    BadKeyLength,
    BadInputLength,
    BadOutputLength,
    NotYetFinalized,
    TagMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoCategory {
    BlockCipher,
    Digest,
    BlockCipherAuth,
}

/// Identifies which registry entry backs a session. Mirrors the order of
/// `algo_table` in `se3_security_core.c` exactly — entry 0 is `Aes`, the
/// remaining three slots up to [`ALGO_MAX`] are unused (reserved, not
/// addressable by [`descriptor`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoKind {
    Aes,
    Sha256,
    HmacSha256,
    AesHmacSha256s,
    Aes256HmacSha256,
}

#[derive(Debug, Clone, Copy)]
pub struct AlgoDescriptor {
    pub kind: Option<AlgoKind>,
    pub name: &'static str,
    pub category: AlgoCategory,
    pub block_size: u16,
    pub key_size: u16,
}

const EMPTY: AlgoDescriptor = AlgoDescriptor {
    kind: None,
    name: "",
    category: AlgoCategory::Digest,
    block_size: 0,
    key_size: 0,
};

/// Registry of algorithms this core knows how to run, in wire-id order.
/// Wire ids are positions in this table, same as the original's
/// `algo_table` array — `Aes` at 0, two NULL-sentinel-equivalent slots
/// at the tail.
pub static TABLE: [AlgoDescriptor; ALGO_MAX] = [
    AlgoDescriptor {
        kind: Some(AlgoKind::Aes),
        name: "Aes",
        category: AlgoCategory::BlockCipher,
        block_size: aes::BLOCK_SIZE,
        key_size: aes::KEY_SIZE,
    },
    AlgoDescriptor {
        kind: Some(AlgoKind::Sha256),
        name: "Sha256",
        category: AlgoCategory::Digest,
        block_size: sha256::DIGEST_SIZE,
        key_size: 0,
    },
    AlgoDescriptor {
        kind: Some(AlgoKind::HmacSha256),
        name: "HmacSha256",
        category: AlgoCategory::Digest,
        block_size: hmac_sha256::DIGEST_SIZE,
        key_size: hmac_sha256::KEY_SIZE,
    },
    AlgoDescriptor {
        kind: Some(AlgoKind::AesHmacSha256s),
        name: "AesHmacSha256s",
        category: AlgoCategory::BlockCipherAuth,
        block_size: aes_hmac_sha256s::BLOCK_SIZE,
        key_size: aes_hmac_sha256s::KEY_SIZE,
    },
    AlgoDescriptor {
        kind: Some(AlgoKind::Aes256HmacSha256),
        name: "AES256HMACSHA256",
        category: AlgoCategory::BlockCipherAuth,
        block_size: aes256_hmac_sha256::BLOCK_SIZE,
        key_size: aes256_hmac_sha256::KEY_SIZE,
    },
    EMPTY,
    EMPTY,
    EMPTY,
];

/// Look up a registry entry by wire id. `None` for out-of-range or
/// reserved (sentinel) ids.
pub fn descriptor(algo_id: u16) -> Option<&'static AlgoDescriptor> {
    let entry = TABLE.get(algo_id as usize)?;
    entry.kind?;
    Some(entry)
}

/// One algorithm's live state, tagged by which registry entry produced
/// it. Replaces the original's `void *ctx` plus parallel `sessions_algo`
/// lookup with a single value that carries its own kind.
pub enum AlgoContext {
    Aes(aes::Context),
    Sha256(sha256::Context),
    HmacSha256(hmac_sha256::Context),
    AesHmacSha256s(aes_hmac_sha256s::Context),
    Aes256HmacSha256(aes256_hmac_sha256::Context),
}

impl AlgoContext {
    pub fn kind(&self) -> AlgoKind {
        match self {
            AlgoContext::Aes(_) => AlgoKind::Aes,
            AlgoContext::Sha256(_) => AlgoKind::Sha256,
            AlgoContext::HmacSha256(_) => AlgoKind::HmacSha256,
            AlgoContext::AesHmacSha256s(_) => AlgoKind::AesHmacSha256s,
            AlgoContext::Aes256HmacSha256(_) => AlgoKind::Aes256HmacSha256,
        }
    }
}

/// Best-effort scrub of session key material on session free. Opaque
/// cipher/MAC state from upstream crates can't be zeroed field-by-field
/// without reaching into private internals, so the variants that wrap
/// such state are rebuilt from a zero key in place, overwriting whatever
/// key schedule or MAC state occupied that memory with non-secret
/// derived bytes. The combined-mode variants keep their raw key copies
/// inline and those are zeroed directly.
impl zeroize::Zeroize for AlgoContext {
    fn zeroize(&mut self) {
        match self {
            AlgoContext::Aes(ctx) => ctx.zeroize(),
            AlgoContext::Sha256(ctx) => ctx.zeroize(),
            AlgoContext::HmacSha256(ctx) => ctx.zeroize(),
            AlgoContext::AesHmacSha256s(ctx) => ctx.zeroize(),
            AlgoContext::Aes256HmacSha256(ctx) => ctx.zeroize(),
        }
    }
}

/// Initialize a new session context for `kind` from already-resolved key
/// material. `mode` is passed through uninterpreted to the algorithm
/// (the wire-level `crypto_init.mode` field, `spec.md` §4.4.1).
pub fn init(kind: AlgoKind, key: &[u8], mode: u16) -> Result<AlgoContext, AlgoError> {
    Ok(match kind {
        AlgoKind::Aes => AlgoContext::Aes(aes::init(key, mode)?),
        AlgoKind::Sha256 => AlgoContext::Sha256(sha256::init(key, mode)?),
        AlgoKind::HmacSha256 => AlgoContext::HmacSha256(hmac_sha256::init(key, mode)?),
        AlgoKind::AesHmacSha256s => AlgoContext::AesHmacSha256s(aes_hmac_sha256s::init(key, mode)?),
        AlgoKind::Aes256HmacSha256 => AlgoContext::Aes256HmacSha256(aes256_hmac_sha256::init(key, mode)?),
    })
}

/// Advance a session with one `crypto_update` call's worth of input,
/// writing output into `dataout` and returning how much of it was used.
pub fn update(
    ctx: &mut AlgoContext,
    flags: CmdFlags,
    datain1: &[u8],
    datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    match ctx {
        AlgoContext::Aes(c) => aes::update(c, flags, datain1, datain2, dataout),
        AlgoContext::Sha256(c) => sha256::update(c, flags, datain1, datain2, dataout),
        AlgoContext::HmacSha256(c) => hmac_sha256::update(c, flags, datain1, datain2, dataout),
        AlgoContext::AesHmacSha256s(c) => aes_hmac_sha256s::update(c, flags, datain1, datain2, dataout),
        AlgoContext::Aes256HmacSha256(c) => aes256_hmac_sha256::update(c, flags, datain1, datain2, dataout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_the_original_registration_order() {
        assert_eq!(descriptor(0).unwrap().kind, Some(AlgoKind::Aes));
        assert_eq!(descriptor(1).unwrap().kind, Some(AlgoKind::Sha256));
        assert_eq!(descriptor(2).unwrap().kind, Some(AlgoKind::HmacSha256));
        assert_eq!(descriptor(3).unwrap().kind, Some(AlgoKind::AesHmacSha256s));
        assert_eq!(descriptor(4).unwrap().kind, Some(AlgoKind::Aes256HmacSha256));
    }

    #[test]
    fn trailing_slots_are_reserved() {
        assert!(descriptor(5).is_none());
        assert!(descriptor(6).is_none());
        assert!(descriptor(7).is_none());
    }

    #[test]
    fn out_of_range_id_is_none() {
        assert!(descriptor(ALGO_MAX as u16).is_none());
    }
}
