//! Streaming AES-256-CBC + HMAC-SHA256 session (`AesHmacSha256s`).
//!
//! The `s` is for streaming: unlike [`super::aes256_hmac_sha256`], this
//! mirrors `se3_crypto_init_aeshmacsha256s` and keeps both AES chaining
//! state and a running HMAC alive across calls, the combined size of
//! `B5_tAesCtx` and `B5_tHmacSha256Ctx` plus bookkeeping in the
//! original's context struct. The MAC always runs over ciphertext:
//! encrypt-then-update-tag on the way out, update-tag-then-decrypt on
//! the way in. The tag only covers the whole stream and is only
//! checked on the `FINIT` call, same as the original: a decrypting
//! caller that acts on an intermediate chunk's plaintext before the
//! final call returns does so before the tamper check has run.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::AlgoError;
use crate::flags::CmdFlags;

pub const BLOCK_SIZE: u16 = 16;
pub const KEY_SIZE: u16 = 32;
pub const TAG_SIZE: usize = 32;

pub const MODE_ENCRYPT: u16 = 0;
pub const MODE_DECRYPT: u16 = 1;

enum Cipher {
    Enc(cbc::Encryptor<Aes256>),
    Dec(cbc::Decryptor<Aes256>),
}

pub struct Context {
    cipher: Cipher,
    mac: Hmac<Sha256>,
}

pub fn init(key: &[u8], mode: u16) -> Result<Context, AlgoError> {
    if key.len() != KEY_SIZE as usize {
        return Err(AlgoError::BadKeyLength);
    }
    let aes_key = GenericArray::from_slice(key);
    let iv = GenericArray::default();
    let cipher = if mode == MODE_DECRYPT {
        Cipher::Dec(cbc::Decryptor::<Aes256>::new(aes_key, &iv))
    } else {
        Cipher::Enc(cbc::Encryptor::<Aes256>::new(aes_key, &iv))
    };
    let mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| AlgoError::BadKeyLength)?;
    Ok(Context { cipher, mac })
}

/// On `FINIT` for an encrypting session, the computed tag is appended
/// after the ciphertext. On `FINIT` for a decrypting session, `datain2`
/// must carry the expected tag; a mismatch is [`AlgoError::TagMismatch`]
/// and `dataout` is left untouched.
pub fn update(
    ctx: &mut Context,
    flags: CmdFlags,
    datain1: &[u8],
    datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    if datain1.len() % BLOCK_SIZE as usize != 0 {
        return Err(AlgoError::BadInputLength);
    }
    let finit = flags.contains(CmdFlags::FINIT);
    let is_decrypt = matches!(ctx.cipher, Cipher::Dec(_));
    let tag_room = if finit && !is_decrypt { TAG_SIZE } else { 0 };
    if dataout.len() < datain1.len() + tag_room {
        return Err(AlgoError::BadOutputLength);
    }

    match &mut ctx.cipher {
        Cipher::Enc(enc) => {
            let buf = &mut dataout[..datain1.len()];
            buf.copy_from_slice(datain1);
            for chunk in buf.chunks_exact_mut(16) {
                enc.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
            ctx.mac.update(buf);
            if finit {
                let tag = ctx.mac.clone().finalize().into_bytes();
                dataout[datain1.len()..datain1.len() + TAG_SIZE].copy_from_slice(&tag);
                Ok(datain1.len() + TAG_SIZE)
            } else {
                Ok(datain1.len())
            }
        }
        Cipher::Dec(dec) => {
            ctx.mac.update(datain1);
            if finit {
                if datain2.len() != TAG_SIZE {
                    return Err(AlgoError::TagMismatch);
                }
                let tag = ctx.mac.clone().finalize().into_bytes();
                let ok: bool = tag.as_slice().ct_eq(datain2).into();
                if !ok {
                    return Err(AlgoError::TagMismatch);
                }
            }
            let buf = &mut dataout[..datain1.len()];
            buf.copy_from_slice(datain1);
            for chunk in buf.chunks_exact_mut(16) {
                dec.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
            Ok(datain1.len())
        }
    }
}

impl zeroize::Zeroize for Context {
    fn zeroize(&mut self) {
        let zero_key = GenericArray::default();
        let zero_iv = GenericArray::default();
        self.cipher = match self.cipher {
            Cipher::Enc(_) => Cipher::Enc(cbc::Encryptor::<Aes256>::new(&zero_key, &zero_iv)),
            Cipher::Dec(_) => Cipher::Dec(cbc::Decryptor::<Aes256>::new(&zero_key, &zero_iv)),
        };
        if let Ok(mac) = Hmac::<Sha256>::new_from_slice(&[0u8; KEY_SIZE as usize]) {
            self.mac = mac;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_across_calls_and_round_trips_with_tag_check() {
        let key = [0x7au8; 32];
        let mut enc = init(&key, MODE_ENCRYPT).unwrap();

        let mut ct1 = [0u8; 16];
        update(&mut enc, CmdFlags::empty(), &[0x01; 16], &[], &mut ct1).unwrap();

        let mut ct2_and_tag = [0u8; 16 + TAG_SIZE];
        let n = update(&mut enc, CmdFlags::FINIT, &[0x02; 16], &[], &mut ct2_and_tag).unwrap();
        assert_eq!(n, 16 + TAG_SIZE);
        let tag = ct2_and_tag[16..].to_vec();

        let mut dec = init(&key, MODE_DECRYPT).unwrap();
        let mut pt1 = [0u8; 16];
        update(&mut dec, CmdFlags::empty(), &ct1, &[], &mut pt1).unwrap();
        assert_eq!(pt1, [0x01; 16]);

        let mut pt2 = [0u8; 16];
        let n = update(&mut dec, CmdFlags::FINIT, &ct2_and_tag[..16], &tag, &mut pt2).unwrap();
        assert_eq!(n, 16);
        assert_eq!(pt2, [0x02; 16]);
    }

    #[test]
    fn flipped_tag_is_rejected_before_decrypt() {
        let key = [0x7au8; 32];
        let mut enc = init(&key, MODE_ENCRYPT).unwrap();
        let mut ct = [0u8; 16 + TAG_SIZE];
        update(&mut enc, CmdFlags::FINIT, &[0x03; 16], &[], &mut ct).unwrap();

        let mut bad_tag = ct[16..].to_vec();
        bad_tag[0] ^= 0xff;

        let mut dec = init(&key, MODE_DECRYPT).unwrap();
        let mut out = [0u8; 16];
        let err = update(&mut dec, CmdFlags::FINIT, &ct[..16], &bad_tag, &mut out).unwrap_err();
        assert_eq!(err, AlgoError::TagMismatch);
    }
}
