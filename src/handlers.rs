//! Crypto command handlers (`spec.md` §4.4).
//!
//! Each handler takes `(req, resp) -> status`, mirroring the original's
//! fixed-offset parsing over raw buffers, except fields are read through
//! `zerocopy` views instead of `SE3_GET16`/`SE3_GET32` macros. The
//! `authenticated` gate is checked first, right where the original keeps
//! its commented-out login check, immediately after the request-size
//! check.

use log::{debug, trace, warn};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::algo;
use crate::consts::{KEY_DATA_MAX, KEY_INVALID, REQ1_MAX_DATA, SESSIONS_MAX};
use crate::error::StatusCode;
use crate::flags::CmdFlags;
use crate::flash::FlashDevice;
use crate::key;
use crate::session::SessionArena;
use crate::time::DeviceTime;
use crate::wire::{
    round_up_16, AlgoInfoEntry, CryptoInitReq, CryptoInitResp, CryptoListRespHeader, CryptoSetTimeReq,
    CryptoUpdateReqHeader, CryptoUpdateRespHeader, ALGO_INFO_ENTRY_SIZE, CRYPTO_UPDATE_REQ_HEADER_SIZE,
    CRYPTO_UPDATE_RESP_HEADER_SIZE,
};

fn write_response<T: IntoBytes + Immutable>(resp: &mut [u8], value: &T) -> Result<usize, StatusCode> {
    let bytes = value.as_bytes();
    if resp.len() < bytes.len() {
        return Err(StatusCode::ErrHw);
    }
    resp[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

pub fn crypto_init<F: FlashDevice>(
    arena: &mut SessionArena,
    flash: &F,
    time: &DeviceTime,
    authenticated: bool,
    req: &[u8],
    resp: &mut [u8],
) -> Result<usize, StatusCode> {
    let Some(hdr) = CryptoInitReq::ref_from_bytes(req).ok() else {
        warn!("crypto_init: req size mismatch");
        return Err(StatusCode::ErrParams);
    };
    if !authenticated {
        warn!("crypto_init: login required");
        return Err(StatusCode::ErrAccess);
    }

    let algo_id = hdr.algo.get();
    let mode = hdr.mode.get();
    let key_id = hdr.key_id.get();

    let Some(descriptor) = algo::descriptor(algo_id) else {
        warn!("crypto_init: algo not found ({algo_id})");
        return Err(StatusCode::ErrParams);
    };
    let kind = descriptor.kind.expect("descriptor() only returns registered slots");

    let mut key_buf = zeroize::Zeroizing::new([0u8; KEY_DATA_MAX]);
    let key_len = if key_id == KEY_INVALID {
        trace!("crypto_init: no key requested, using all-zero material");
        KEY_DATA_MAX
    } else {
        let Some(addr) = key::find(flash, key_id) else {
            warn!("crypto_init: key not found ({key_id})");
            return Err(StatusCode::ErrResource);
        };
        let Some(entry) = key::read(flash, addr) else {
            warn!("crypto_init: key unreadable ({key_id})");
            return Err(StatusCode::ErrHw);
        };
        if !time.is_valid(entry.validity) {
            warn!("crypto_init: key expired ({key_id})");
            return Err(StatusCode::ErrExpired);
        }
        key_buf[..entry.len].copy_from_slice(entry.material());
        entry.len
    };

    let sid = arena
        .allocate(kind, &key_buf[..key_len], mode)
        .map_err(StatusCode::from)
        .inspect_err(|_| debug!("crypto_init: cannot allocate session"))?;

    write_response(resp, &CryptoInitResp { sid: U32::new(sid) })
}

pub fn crypto_update(
    arena: &mut SessionArena,
    authenticated: bool,
    req: &[u8],
    resp: &mut [u8],
) -> Result<usize, StatusCode> {
    if req.len() < CRYPTO_UPDATE_REQ_HEADER_SIZE {
        warn!("crypto_update: req size mismatch");
        return Err(StatusCode::ErrParams);
    }
    if !authenticated {
        warn!("crypto_update: login required");
        return Err(StatusCode::ErrAccess);
    }
    let (hdr, rest) = CryptoUpdateReqHeader::ref_from_prefix(req).map_err(|_| StatusCode::ErrParams)?;

    let sid = hdr.sid.get();
    let flags = CmdFlags::from_bits_truncate(hdr.flags.get());
    let datain1_len = hdr.datain1_len.get() as usize;
    let datain2_len = hdr.datain2_len.get() as usize;
    let datain1_len_padded_u32 = round_up_16(hdr.datain1_len.get());

    // `round_up_16` returns a `u32`, so this sum can't overflow even for
    // `datain1_len == u16::MAX`; compare against `REQ1_MAX_DATA` before
    // narrowing back to `usize` for the slicing below.
    let total = CRYPTO_UPDATE_REQ_HEADER_SIZE as u32 + datain1_len_padded_u32 + datain2_len as u32;
    if total > REQ1_MAX_DATA as u32 {
        warn!("crypto_update: request exceeds REQ1_MAX_DATA");
        return Err(StatusCode::ErrParams);
    }
    let datain1_len_padded = datain1_len_padded_u32 as usize;
    if rest.len() < datain1_len_padded + datain2_len {
        warn!("crypto_update: req size mismatch");
        return Err(StatusCode::ErrParams);
    }
    if sid >= SESSIONS_MAX as u32 {
        warn!("crypto_update: sid out of range ({sid})");
        return Err(StatusCode::ErrResource);
    }

    let datain1 = &rest[..datain1_len];
    let datain2 = &rest[datain1_len_padded..datain1_len_padded + datain2_len];

    if resp.len() < CRYPTO_UPDATE_RESP_HEADER_SIZE {
        return Err(StatusCode::ErrHw);
    }
    let (resp_hdr, dataout) = resp.split_at_mut(CRYPTO_UPDATE_RESP_HEADER_SIZE);

    let dataout_len = arena
        .update(sid, flags, datain1, datain2, dataout)
        .map_err(StatusCode::from)
        .inspect_err(|_| debug!("crypto_update: primitive failure on sid {sid}"))?;

    let header = CryptoUpdateRespHeader::new(dataout_len as u16);
    resp_hdr.copy_from_slice(header.as_bytes());
    Ok(CRYPTO_UPDATE_RESP_HEADER_SIZE + dataout_len)
}

pub fn crypto_set_time(time: &mut DeviceTime, authenticated: bool, req: &[u8]) -> Result<usize, StatusCode> {
    let Some(hdr) = CryptoSetTimeReq::ref_from_bytes(req).ok() else {
        warn!("crypto_set_time: req size mismatch");
        return Err(StatusCode::ErrParams);
    };
    if !authenticated {
        warn!("crypto_set_time: login required");
        return Err(StatusCode::ErrAccess);
    }
    debug!("crypto_set_time: devtime={}", hdr.devtime.get());
    time.set(hdr.devtime.get());
    Ok(0)
}

pub fn crypto_list(authenticated: bool, resp: &mut [u8]) -> Result<usize, StatusCode> {
    if !authenticated {
        warn!("crypto_list: login required");
        return Err(StatusCode::ErrAccess);
    }

    let registered: heapless::Vec<_, { crate::consts::ALGO_MAX }> =
        algo::TABLE.iter().filter(|d| d.kind.is_some()).collect();

    let header_size = core::mem::size_of::<CryptoListRespHeader>();
    let needed = header_size + registered.len() * ALGO_INFO_ENTRY_SIZE;
    if resp.len() < needed {
        return Err(StatusCode::ErrHw);
    }

    let header = CryptoListRespHeader {
        count: U16::new(registered.len() as u16),
    };
    resp[..header_size].copy_from_slice(header.as_bytes());

    for (i, descriptor) in registered.iter().enumerate() {
        let mut name = [0u8; 16];
        let bytes = descriptor.name.as_bytes();
        let n = bytes.len().min(16);
        name[..n].copy_from_slice(&bytes[..n]);
        let entry = AlgoInfoEntry {
            name,
            ty: U16::new(category_wire(descriptor.category)),
            block_size: U16::new(descriptor.block_size),
            key_size: U16::new(descriptor.key_size),
        };
        let offset = header_size + i * ALGO_INFO_ENTRY_SIZE;
        resp[offset..offset + ALGO_INFO_ENTRY_SIZE].copy_from_slice(entry.as_bytes());
    }

    Ok(needed)
}

fn category_wire(category: crate::algo::AlgoCategory) -> u16 {
    use crate::algo::AlgoCategory;
    match category {
        AlgoCategory::BlockCipher => 0,
        AlgoCategory::Digest => 1,
        AlgoCategory::BlockCipherAuth => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_datain1_len_is_rejected_without_panicking() {
        let mut arena = SessionArena::new();
        let mut req = [0u8; CRYPTO_UPDATE_REQ_HEADER_SIZE];
        req[4..6].copy_from_slice(&0u16.to_le_bytes()); // flags
        req[6..8].copy_from_slice(&u16::MAX.to_le_bytes()); // datain1_len, not a multiple of 16
        let mut resp = [0u8; 16];
        let err = crypto_update(&mut arena, true, &req, &mut resp).unwrap_err();
        assert_eq!(err, StatusCode::ErrParams);
    }
}
