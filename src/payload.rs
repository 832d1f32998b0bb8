//! Payload channel: derived-key encrypt-then-MAC envelope around every
//! host↔device frame (`spec.md` §4.5).
//!
//! This is a separate channel from the per-session algorithms in
//! `algo/`: one process-wide context, derived once via PBKDF2 and reused
//! for every frame, rather than a pool of independent sessions.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::flags::CmdFlags;

pub const AES_KEY_SIZE: usize = 32;
pub const HMAC_KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 16;
pub const AUTH_SIZE: usize = 16;
pub const BLOCK_SIZE: usize = 16;

/// Payload-channel algorithm codes (`spec.md` §4.5). Only `Aes256` is
/// implemented; the rest are registered names with no behavior, same as
/// the original's "to be implemented" branches, but rejected explicitly
/// instead of falling through undefined (`spec.md` §9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadAlgo {
    Aes256,
    Crc16,
    Pbkdf2,
    Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    UnsupportedAlgo,
    BadInputLength,
    TagMismatch,
}

/// Derived per-direction channel state. Built once via
/// [`PayloadContext::new`] from a base key and reused for every frame.
pub struct PayloadContext {
    aes_key: [u8; AES_KEY_SIZE],
    hmac_key: [u8; HMAC_KEY_SIZE],
}

impl PayloadContext {
    /// PBKDF2-HMAC-SHA-256 over `base_key` with an empty salt and a
    /// single iteration, producing 64 bytes split as `aes_key ‖
    /// hmac_key`. The 64-byte derived buffer is zeroized after the
    /// split (`spec.md` §4.5).
    pub fn new(base_key: &[u8]) -> Self {
        let mut derived = Zeroizing::new([0u8; AES_KEY_SIZE + HMAC_KEY_SIZE]);
        pbkdf2_hmac::<Sha256>(base_key, &[], 1, derived.as_mut());

        let mut aes_key = [0u8; AES_KEY_SIZE];
        let mut hmac_key = [0u8; HMAC_KEY_SIZE];
        aes_key.copy_from_slice(&derived[..AES_KEY_SIZE]);
        hmac_key.copy_from_slice(&derived[AES_KEY_SIZE..]);

        Self { aes_key, hmac_key }
    }

    /// Encrypt `data` in place under `iv` if `flags & ENCRYPT` and
    /// `algo == Aes256`, then compute `auth = HMAC(hmac_key, iv ‖
    /// ciphertext)[..16]` if `flags & SIGN`, else zero `auth`.
    pub fn encrypt(
        &self,
        algo: PayloadAlgo,
        flags: CmdFlags,
        iv: &[u8; IV_SIZE],
        data: &mut [u8],
        auth: &mut [u8; AUTH_SIZE],
    ) -> Result<(), PayloadError> {
        if algo != PayloadAlgo::Aes256 {
            return Err(PayloadError::UnsupportedAlgo);
        }
        if data.len() % BLOCK_SIZE != 0 {
            return Err(PayloadError::BadInputLength);
        }
        if flags.contains(CmdFlags::ENCRYPT) {
            let key = GenericArray::from_slice(&self.aes_key);
            let iv_ga = GenericArray::from_slice(iv);
            let mut enc = cbc::Encryptor::<Aes256>::new(key, iv_ga);
            for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
                enc.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
        }

        if flags.contains(CmdFlags::SIGN) {
            let mut mac = Hmac::<Sha256>::new_from_slice(&self.hmac_key).expect("hmac accepts any key length");
            mac.update(iv);
            mac.update(data);
            let tag = mac.finalize().into_bytes();
            auth.copy_from_slice(&tag[..AUTH_SIZE]);
        } else {
            auth.fill(0);
        }
        Ok(())
    }

    /// Verify `auth` (if `flags & SIGN`) before decrypting, so no
    /// plaintext is ever exposed from a forged or corrupted frame
    /// (`spec.md` §7 Integrity). Tag comparison is constant-time
    /// (`spec.md` §9), unlike the original's `memcmp`.
    pub fn decrypt(
        &self,
        algo: PayloadAlgo,
        flags: CmdFlags,
        iv: &[u8; IV_SIZE],
        data: &mut [u8],
        auth: &[u8; AUTH_SIZE],
    ) -> Result<(), PayloadError> {
        if algo != PayloadAlgo::Aes256 {
            return Err(PayloadError::UnsupportedAlgo);
        }
        if data.len() % BLOCK_SIZE != 0 {
            return Err(PayloadError::BadInputLength);
        }

        if flags.contains(CmdFlags::SIGN) {
            let mut mac = Hmac::<Sha256>::new_from_slice(&self.hmac_key).expect("hmac accepts any key length");
            mac.update(iv);
            mac.update(data);
            let tag = mac.finalize().into_bytes();
            let ok: bool = tag[..AUTH_SIZE].ct_eq(auth).into();
            if !ok {
                return Err(PayloadError::TagMismatch);
            }
        }

        if flags.contains(CmdFlags::ENCRYPT) {
            let key = GenericArray::from_slice(&self.aes_key);
            let iv_ga = GenericArray::from_slice(iv);
            let mut dec = cbc::Decryptor::<Aes256>::new(key, iv_ga);
            for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
                dec.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
        }
        Ok(())
    }
}

impl zeroize::Zeroize for PayloadContext {
    fn zeroize(&mut self) {
        self.aes_key.zeroize();
        self.hmac_key.zeroize();
    }
}
