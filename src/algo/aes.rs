//! Generic AES-256-CBC session algorithm (`Aes` in the registry,
//! `algo_table[SE3_ALGO_AES]` in the original).
//!
//! The wire protocol's `crypto_init` carries no IV field, so a session
//! starts chaining from an all-zero IV and keeps going across
//! successive `crypto_update` calls until `FINIT` frees it. This is a
//! raw block-cipher session, not the authenticated payload channel in
//! `payload.rs` — no MAC is computed here.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;

use super::AlgoError;
use crate::flags::CmdFlags;

pub const BLOCK_SIZE: u16 = 16;
pub const KEY_SIZE: u16 = 32;

/// `crypto_init.mode` values this algorithm understands.
pub const MODE_ENCRYPT: u16 = 0;
pub const MODE_DECRYPT: u16 = 1;

enum Cipher {
    Enc(cbc::Encryptor<Aes256>),
    Dec(cbc::Decryptor<Aes256>),
}

pub struct Context {
    cipher: Cipher,
}

pub fn init(key: &[u8], mode: u16) -> Result<Context, AlgoError> {
    if key.len() != KEY_SIZE as usize {
        return Err(AlgoError::BadKeyLength);
    }
    let key = GenericArray::from_slice(key);
    let iv = GenericArray::default();
    let cipher = if mode == MODE_DECRYPT {
        Cipher::Dec(cbc::Decryptor::<Aes256>::new(key, &iv))
    } else {
        Cipher::Enc(cbc::Encryptor::<Aes256>::new(key, &iv))
    };
    Ok(Context { cipher })
}

/// `datain2` is unused by this algorithm; `FINIT` has no special effect
/// beyond the caller freeing the session afterward.
pub fn update(
    ctx: &mut Context,
    _flags: CmdFlags,
    datain1: &[u8],
    _datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    if datain1.len() % BLOCK_SIZE as usize != 0 {
        return Err(AlgoError::BadInputLength);
    }
    if dataout.len() < datain1.len() {
        return Err(AlgoError::BadOutputLength);
    }
    let buf = &mut dataout[..datain1.len()];
    buf.copy_from_slice(datain1);
    match &mut ctx.cipher {
        Cipher::Enc(enc) => {
            for chunk in buf.chunks_exact_mut(16) {
                enc.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
        }
        Cipher::Dec(dec) => {
            for chunk in buf.chunks_exact_mut(16) {
                dec.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
            }
        }
    }
    Ok(datain1.len())
}

impl zeroize::Zeroize for Context {
    fn zeroize(&mut self) {
        let zero_key = GenericArray::default();
        let zero_iv = GenericArray::default();
        self.cipher = match self.cipher {
            Cipher::Enc(_) => Cipher::Enc(cbc::Encryptor::<Aes256>::new(&zero_key, &zero_iv)),
            Cipher::Dec(_) => Cipher::Dec(cbc::Decryptor::<Aes256>::new(&zero_key, &zero_iv)),
        };
    }
}
