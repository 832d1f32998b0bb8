//! One-shot AES-256-CBC + HMAC-SHA256 session (`Aes256HmacSha256`).
//!
//! The original sizes this context as exactly `sizeof(B5_tAesCtx) +
//! sizeof(B5_tHmacSha256Ctx)`, with no extra phase or length fields the
//! way `AesHmacSha256s`'s struct has — so unlike that streaming sibling,
//! this algorithm has no partial-call state to carry: the whole message
//! must arrive in one `crypto_update` call with `FINIT` set.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::AlgoError;
use crate::flags::CmdFlags;

pub const BLOCK_SIZE: u16 = 16;
pub const KEY_SIZE: u16 = 32;
pub const TAG_SIZE: usize = 32;

pub const MODE_ENCRYPT: u16 = 0;
pub const MODE_DECRYPT: u16 = 1;

pub struct Context {
    key: [u8; KEY_SIZE as usize],
    mode: u16,
}

pub fn init(key: &[u8], mode: u16) -> Result<Context, AlgoError> {
    if key.len() != KEY_SIZE as usize {
        return Err(AlgoError::BadKeyLength);
    }
    let mut owned = [0u8; KEY_SIZE as usize];
    owned.copy_from_slice(key);
    Ok(Context { key: owned, mode })
}

/// Requires `FINIT`; any call without it is [`AlgoError::NotYetFinalized`].
/// Encrypting sessions write ciphertext followed by a 32-byte tag.
/// Decrypting sessions expect the tag in `datain2`, verify it
/// constant-time, and only then decrypt into `dataout`.
pub fn update(
    ctx: &mut Context,
    flags: CmdFlags,
    datain1: &[u8],
    datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    if !flags.contains(CmdFlags::FINIT) {
        return Err(AlgoError::NotYetFinalized);
    }
    if datain1.len() % BLOCK_SIZE as usize != 0 {
        return Err(AlgoError::BadInputLength);
    }

    let key = GenericArray::from_slice(&ctx.key);
    let iv = GenericArray::default();

    if ctx.mode == MODE_DECRYPT {
        if datain2.len() != TAG_SIZE {
            return Err(AlgoError::TagMismatch);
        }
        let mut mac = Hmac::<Sha256>::new_from_slice(&ctx.key).map_err(|_| AlgoError::BadKeyLength)?;
        mac.update(datain1);
        let tag = mac.finalize().into_bytes();
        let ok: bool = tag.as_slice().ct_eq(datain2).into();
        if !ok {
            return Err(AlgoError::TagMismatch);
        }
        if dataout.len() < datain1.len() {
            return Err(AlgoError::BadOutputLength);
        }
        let buf = &mut dataout[..datain1.len()];
        buf.copy_from_slice(datain1);
        let mut dec = cbc::Decryptor::<Aes256>::new(key, &iv);
        for chunk in buf.chunks_exact_mut(16) {
            dec.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
        Ok(datain1.len())
    } else {
        if dataout.len() < datain1.len() + TAG_SIZE {
            return Err(AlgoError::BadOutputLength);
        }
        let buf = &mut dataout[..datain1.len()];
        buf.copy_from_slice(datain1);
        let mut enc = cbc::Encryptor::<Aes256>::new(key, &iv);
        for chunk in buf.chunks_exact_mut(16) {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
        let mut mac = Hmac::<Sha256>::new_from_slice(&ctx.key).map_err(|_| AlgoError::BadKeyLength)?;
        mac.update(&dataout[..datain1.len()]);
        let tag = mac.finalize().into_bytes();
        dataout[datain1.len()..datain1.len() + TAG_SIZE].copy_from_slice(&tag);
        Ok(datain1.len() + TAG_SIZE)
    }
}

impl zeroize::Zeroize for Context {
    fn zeroize(&mut self) {
        self.key.zeroize();
    }
}
