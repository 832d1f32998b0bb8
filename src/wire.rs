//! Fixed-offset request/response frame layouts.
//!
//! All multi-byte integers are little-endian on the wire (`spec.md` §6).
//! These structs play the role the original firmware gives to
//! `SE3_GET16`/`SE3_SET16`/`SE3_GET32` macros over raw byte offsets: a
//! `zerocopy`-backed typed view straight onto the request/response
//! buffer, with no copying and no `unsafe`.

use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const CRYPTO_ALGOINFO_NAME_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoInitReq {
    pub algo: U16,
    pub mode: U16,
    pub key_id: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoInitResp {
    pub sid: U32,
}

/// Fixed header of a `crypto_update` request. `datain1`/`datain2` follow
/// in the request buffer past this header, per the padding rules in
/// `spec.md` §4.4.2.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoUpdateReqHeader {
    pub sid: U32,
    pub flags: U16,
    pub datain1_len: U16,
    pub datain2_len: U16,
    _pad: [u8; 6],
}

pub const CRYPTO_UPDATE_REQ_HEADER_SIZE: usize = core::mem::size_of::<CryptoUpdateReqHeader>();

/// Fixed header of a `crypto_update` response; `dataout` follows.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoUpdateRespHeader {
    pub dataout_len: U16,
    _pad: [u8; 14],
}

impl CryptoUpdateRespHeader {
    pub fn new(dataout_len: u16) -> Self {
        Self {
            dataout_len: U16::new(dataout_len),
            _pad: [0u8; 14],
        }
    }
}

pub const CRYPTO_UPDATE_RESP_HEADER_SIZE: usize = core::mem::size_of::<CryptoUpdateRespHeader>();

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoSetTimeReq {
    pub devtime: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryptoListRespHeader {
    pub count: U16,
}

/// One entry of `crypto_list`'s response body (`spec.md` §6).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct AlgoInfoEntry {
    pub name: [u8; CRYPTO_ALGOINFO_NAME_SIZE],
    pub ty: U16,
    pub block_size: U16,
    pub key_size: U16,
}

pub const ALGO_INFO_ENTRY_SIZE: usize = core::mem::size_of::<AlgoInfoEntry>();

/// Round a length up to the next multiple of 16, as `crypto_update`
/// requires for `datain1`'s in-buffer padding. Widened to `u32` so
/// rounding up a `len` near `u16::MAX` can't overflow; callers compare
/// the result against `REQ1_MAX_DATA` before narrowing it back down.
pub const fn round_up_16(len: u16) -> u32 {
    let len = len as u32;
    let rem = len % 16;
    if rem == 0 {
        len
    } else {
        len + (16 - rem)
    }
}
