//! HMAC-SHA256 digest session (`HmacSha256` in the registry).
//!
//! Same shape as [`super::sha256`] but keyed, matching the original's
//! `B5_tHmacSha256Ctx` entry (`key_size = B5_AES_256`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::AlgoError;
use crate::flags::CmdFlags;

pub const DIGEST_SIZE: u16 = 32;
pub const KEY_SIZE: u16 = 32;

pub struct Context {
    mac: Hmac<Sha256>,
}

pub fn init(key: &[u8], _mode: u16) -> Result<Context, AlgoError> {
    let mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| AlgoError::BadKeyLength)?;
    Ok(Context { mac })
}

pub fn update(
    ctx: &mut Context,
    flags: CmdFlags,
    datain1: &[u8],
    _datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    ctx.mac.update(datain1);
    if !flags.contains(CmdFlags::FINIT) {
        return Ok(0);
    }
    if dataout.len() < DIGEST_SIZE as usize {
        return Err(AlgoError::BadOutputLength);
    }
    let tag = ctx.mac.clone().finalize().into_bytes();
    dataout[..DIGEST_SIZE as usize].copy_from_slice(&tag);
    Ok(DIGEST_SIZE as usize)
}

impl zeroize::Zeroize for Context {
    fn zeroize(&mut self) {
        if let Ok(mac) = Hmac::<Sha256>::new_from_slice(&[0u8; KEY_SIZE as usize]) {
            self.mac = mac;
        }
    }
}
