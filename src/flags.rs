//! Command flag bits shared by `crypto_update` and the payload channel
//! (`spec.md` §6).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CmdFlags: u16 {
        /// Payload channel: perform the AES step.
        const ENCRYPT = 0b0000_0001;
        /// Payload channel: attach/verify the HMAC tag.
        const SIGN    = 0b0000_0010;
        /// `crypto_update`: finalize and free the session regardless of
        /// output size.
        const FINIT   = 0b0000_0100;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finit_bit_is_independent_of_encrypt_sign() {
        let flags = CmdFlags::ENCRYPT | CmdFlags::SIGN;
        assert!(!flags.contains(CmdFlags::FINIT));
        assert!(flags.contains(CmdFlags::ENCRYPT));
        assert!(flags.contains(CmdFlags::SIGN));
    }
}
