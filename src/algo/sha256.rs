//! SHA-256 digest session (`Sha256` in the registry).
//!
//! A digest session takes no key. Output is only produced on `FINIT`;
//! every call before that just feeds more bytes in.

use sha2::{Digest, Sha256};

use super::AlgoError;
use crate::flags::CmdFlags;

pub const DIGEST_SIZE: u16 = 32;

#[derive(Clone)]
pub struct Context {
    hasher: Sha256,
}

pub fn init(_key: &[u8], _mode: u16) -> Result<Context, AlgoError> {
    Ok(Context { hasher: Sha256::new() })
}

pub fn update(
    ctx: &mut Context,
    flags: CmdFlags,
    datain1: &[u8],
    _datain2: &[u8],
    dataout: &mut [u8],
) -> Result<usize, AlgoError> {
    ctx.hasher.update(datain1);
    if !flags.contains(CmdFlags::FINIT) {
        return Ok(0);
    }
    if dataout.len() < DIGEST_SIZE as usize {
        return Err(AlgoError::BadOutputLength);
    }
    let digest = ctx.hasher.clone().finalize();
    dataout[..DIGEST_SIZE as usize].copy_from_slice(&digest);
    Ok(DIGEST_SIZE as usize)
}

impl zeroize::Zeroize for Context {
    fn zeroize(&mut self) {
        self.hasher = Sha256::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_only_appears_on_finit() {
        let mut ctx = init(&[], 0).unwrap();
        let mut out = [0u8; 32];
        assert_eq!(update(&mut ctx, CmdFlags::empty(), b"abc", &[], &mut out).unwrap(), 0);
        let n = update(&mut ctx, CmdFlags::FINIT, b"", &[], &mut out).unwrap();
        assert_eq!(n, 32);
        // sha256("abc")
        assert_eq!(
            out,
            [
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, 0xb0,
                0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
            ]
        );
    }

    #[test]
    fn short_output_buffer_is_rejected() {
        let mut ctx = init(&[], 0).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(
            update(&mut ctx, CmdFlags::FINIT, b"abc", &[], &mut out).unwrap_err(),
            AlgoError::BadOutputLength
        );
    }
}
