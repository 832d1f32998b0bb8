//! Key lookup (`spec.md` §4.3).
//!
//! Keys are created and updated by commands outside this core (§1, §3);
//! this module only finds and reads them. Validity is checked by the
//! caller (`crypto_init`, §4.4.1) against the device time authority.

use crate::consts::KEY_DATA_MAX;
use crate::flash::{BlockKind, FlashAddr, FlashDevice, FlashIterator};

const OFFSET_ID: usize = 0;
const OFFSET_VALIDITY: usize = OFFSET_ID + 4;
const OFFSET_LEN: usize = OFFSET_VALIDITY + 4;
const OFFSET_DATA: usize = OFFSET_LEN + 1;
pub(crate) const KEY_BLOCK_SIZE: usize = OFFSET_DATA + KEY_DATA_MAX;

/// A key entry read back from flash.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    pub id: u32,
    pub validity: u32,
    pub data: [u8; KEY_DATA_MAX],
    pub len: usize,
}

impl KeyEntry {
    pub fn material(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Find the flash address of the live key block with id `id`.
pub fn find<F: FlashDevice>(flash: &F, id: u32) -> Option<FlashAddr> {
    let mut it = flash.iter();
    while it.advance() {
        if it.kind() != BlockKind::Key {
            continue;
        }
        let mut id_bytes = [0u8; 4];
        if !flash.read(it.addr(), OFFSET_ID, &mut id_bytes) {
            continue;
        }
        if u32::from_le_bytes(id_bytes) == id {
            return Some(it.addr());
        }
    }
    None
}

/// Read a key entry at a flash address previously returned by [`find`].
pub fn read<F: FlashDevice>(flash: &F, addr: FlashAddr) -> Option<KeyEntry> {
    let mut id_bytes = [0u8; 4];
    let mut validity_bytes = [0u8; 4];
    let mut len_byte = [0u8; 1];
    if !flash.read(addr, OFFSET_ID, &mut id_bytes)
        || !flash.read(addr, OFFSET_VALIDITY, &mut validity_bytes)
        || !flash.read(addr, OFFSET_LEN, &mut len_byte)
    {
        return None;
    }
    let len = (len_byte[0] as usize).min(KEY_DATA_MAX);
    let mut data = [0u8; KEY_DATA_MAX];
    if !flash.read(addr, OFFSET_DATA, &mut data[..len]) {
        return None;
    }
    Some(KeyEntry {
        id: u32::from_le_bytes(id_bytes),
        validity: u32::from_le_bytes(validity_bytes),
        data,
        len,
    })
}

/// Test/bring-up helper standing in for the out-of-scope external
/// key-management commands: writes a key entry directly, bypassing the
/// record-store conventions this core otherwise only reads through.
#[cfg(any(test, feature = "std"))]
pub fn provision<F: FlashDevice>(flash: &mut F, id: u32, validity: u32, material: &[u8]) -> Option<FlashAddr> {
    let len = material.len().min(KEY_DATA_MAX);
    let addr = flash.new_block(BlockKind::Key, KEY_BLOCK_SIZE)?;
    flash.write(addr, OFFSET_ID, &id.to_le_bytes());
    flash.write(addr, OFFSET_VALIDITY, &validity.to_le_bytes());
    flash.write(addr, OFFSET_LEN, &[len as u8]);
    flash.write(addr, OFFSET_DATA, &material[..len]);
    Some(addr)
}
