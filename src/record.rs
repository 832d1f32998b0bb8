//! Typed records over the flash iterator (`spec.md` §4.3).
//!
//! At most one live record of a given type exists at any time. The
//! write-new-then-delete-old ordering in [`set`] is the load-bearing
//! invariant carried over from the original `record_set`: a crash between
//! allocating the new block and deleting the old one leaves both, which
//! is recoverable, but a crash after deleting the old block first could
//! leave zero — so deletion always comes last.

use crate::consts::RECORD_SIZE;
use crate::flash::{BlockKind, FlashAddr, FlashDevice, FlashIterator};

const OFFSET_TYPE: usize = 0;
const SIZE_TYPE: usize = 2;
const OFFSET_DATA: usize = OFFSET_TYPE + SIZE_TYPE;
const BLOCK_SIZE: usize = OFFSET_DATA + RECORD_SIZE;

fn find<F: FlashDevice>(flash: &F, record_type: u16) -> Option<FlashAddr> {
    let mut it = flash.iter();
    while it.advance() {
        if it.kind() != BlockKind::Record {
            continue;
        }
        let mut ty_bytes = [0u8; SIZE_TYPE];
        if !flash.read(it.addr(), OFFSET_TYPE, &mut ty_bytes) {
            continue;
        }
        if u16::from_le_bytes(ty_bytes) == record_type {
            return Some(it.addr());
        }
    }
    None
}

/// Replace (or create) the live record of `record_type`, returning
/// `false` if `record_type` is out of range or the flash device rejects
/// the write.
pub fn set<F: FlashDevice>(flash: &mut F, record_type: u16, data: &[u8; RECORD_SIZE], record_max: u16) -> bool {
    if record_type >= record_max {
        return false;
    }
    let prior = find(flash, record_type);

    let Some(addr) = flash.new_block(BlockKind::Record, BLOCK_SIZE) else {
        return false;
    };
    if !flash.write(addr, OFFSET_DATA, data) {
        return false;
    }
    if !flash.write(addr, OFFSET_TYPE, &record_type.to_le_bytes()) {
        return false;
    }

    if let Some(old) = prior {
        flash.delete(old);
    }
    true
}

/// Read the live record of `record_type` into `out`, returning `false`
/// if no such record exists.
pub fn get<F: FlashDevice>(flash: &F, record_type: u16, record_max: u16, out: &mut [u8; RECORD_SIZE]) -> bool {
    if record_type >= record_max {
        return false;
    }
    let Some(addr) = find(flash, record_type) else {
        return false;
    };
    flash.read(addr, OFFSET_DATA, out)
}
