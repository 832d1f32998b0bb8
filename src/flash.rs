//! Flash abstraction.
//!
//! The physical flash driver is an out-of-scope collaborator
//! (`spec.md` §1): this module only states the contract the record store
//! and key lookup (§4.3) need from it, generalizing the original's
//! `se3_flash_it_next/new/write/delete` primitives into a trait so the
//! rest of the crate never touches hardware directly — the same shape as
//! the corpus's driver servers being generic over a controller type
//! (`digest-server`'s `ServerImpl<D: HubrisDigestDevice>`).

/// Category of a flash block, distinguishing records from keys and from
/// anything else sharing the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Record,
    Key,
    Other,
}

/// Opaque address of a block, stable for the block's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashAddr(pub usize);

/// An iterator walking live blocks in allocation order, mirroring
/// `se3_flash_it`.
pub trait FlashIterator {
    fn advance(&mut self) -> bool;
    fn kind(&self) -> BlockKind;
    fn addr(&self) -> FlashAddr;
}

/// The out-of-scope physical flash driver's contract. `record_set`
/// depends on `new_block`/`write`/`delete` being applied in that order
/// (`spec.md` §4.3): the previous block is invalidated only after the
/// new one is durably allocated and written.
pub trait FlashDevice {
    type Iter<'a>: FlashIterator
    where
        Self: 'a;

    fn iter(&self) -> Self::Iter<'_>;
    fn new_block(&mut self, kind: BlockKind, size: usize) -> Option<FlashAddr>;
    fn write(&mut self, addr: FlashAddr, offset: usize, data: &[u8]) -> bool;
    fn read(&self, addr: FlashAddr, offset: usize, out: &mut [u8]) -> bool;
    fn delete(&mut self, addr: FlashAddr) -> bool;
}

#[cfg(any(test, feature = "std"))]
pub use ram::RamFlash;

#[cfg(any(test, feature = "std"))]
mod ram {
    use super::{BlockKind, FlashAddr, FlashDevice, FlashIterator};
    use heapless::Vec;

    struct Block<const N: usize> {
        kind: BlockKind,
        data: Vec<u8, N>,
        live: bool,
    }

    /// RAM-backed reference [`FlashDevice`], used by this crate's own
    /// tests and by host tooling that wants to drive the engine without
    /// real flash. Not a production flash driver: nothing here survives
    /// a restart, and there is no crash-atomicity story (`spec.md` §9).
    pub struct RamFlash<const CAP: usize, const BLOCK: usize> {
        blocks: Vec<Block<BLOCK>, CAP>,
    }

    impl<const CAP: usize, const BLOCK: usize> RamFlash<CAP, BLOCK> {
        pub fn new() -> Self {
            Self { blocks: Vec::new() }
        }
    }

    impl<const CAP: usize, const BLOCK: usize> Default for RamFlash<CAP, BLOCK> {
        fn default() -> Self {
            Self::new()
        }
    }

    pub struct RamFlashIter<'a, const CAP: usize, const BLOCK: usize> {
        blocks: &'a Vec<Block<BLOCK>, CAP>,
        next: usize,
        cursor: Option<usize>,
    }

    impl<'a, const CAP: usize, const BLOCK: usize> FlashIterator for RamFlashIter<'a, CAP, BLOCK> {
        fn advance(&mut self) -> bool {
            while self.next < self.blocks.len() {
                let idx = self.next;
                self.next += 1;
                if self.blocks[idx].live {
                    self.cursor = Some(idx);
                    return true;
                }
            }
            self.cursor = None;
            false
        }

        fn kind(&self) -> BlockKind {
            self.cursor
                .map(|i| self.blocks[i].kind)
                .unwrap_or(BlockKind::Other)
        }

        fn addr(&self) -> FlashAddr {
            FlashAddr(self.cursor.unwrap_or(usize::MAX))
        }
    }

    impl<const CAP: usize, const BLOCK: usize> FlashDevice for RamFlash<CAP, BLOCK> {
        type Iter<'a>
            = RamFlashIter<'a, CAP, BLOCK>
        where
            Self: 'a;

        fn iter(&self) -> Self::Iter<'_> {
            RamFlashIter {
                blocks: &self.blocks,
                next: 0,
                cursor: None,
            }
        }

        fn new_block(&mut self, kind: BlockKind, size: usize) -> Option<FlashAddr> {
            if size > BLOCK {
                return None;
            }
            let mut data = Vec::new();
            data.resize(size, 0).ok()?;
            self.blocks
                .push(Block {
                    kind,
                    data,
                    live: true,
                })
                .ok()?;
            Some(FlashAddr(self.blocks.len() - 1))
        }

        fn write(&mut self, addr: FlashAddr, offset: usize, bytes: &[u8]) -> bool {
            let Some(block) = self.blocks.get_mut(addr.0) else {
                return false;
            };
            if !block.live || offset + bytes.len() > block.data.len() {
                return false;
            }
            block.data[offset..offset + bytes.len()].copy_from_slice(bytes);
            true
        }

        fn read(&self, addr: FlashAddr, offset: usize, out: &mut [u8]) -> bool {
            let Some(block) = self.blocks.get(addr.0) else {
                return false;
            };
            if !block.live || offset + out.len() > block.data.len() {
                return false;
            }
            out.copy_from_slice(&block.data[offset..offset + out.len()]);
            true
        }

        fn delete(&mut self, addr: FlashAddr) -> bool {
            let Some(block) = self.blocks.get_mut(addr.0) else {
                return false;
            };
            block.live = false;
            true
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn write_then_read_round_trips() {
            let mut flash: RamFlash<8, 64> = RamFlash::new();
            let addr = flash.new_block(BlockKind::Record, 4).unwrap();
            assert!(flash.write(addr, 0, &[1, 2, 3, 4]));
            let mut out = [0u8; 4];
            assert!(flash.read(addr, 0, &mut out));
            assert_eq!(out, [1, 2, 3, 4]);
        }

        #[test]
        fn delete_hides_block_from_iteration() {
            let mut flash: RamFlash<8, 64> = RamFlash::new();
            let addr = flash.new_block(BlockKind::Record, 4).unwrap();
            flash.delete(addr);
            let mut it = flash.iter();
            assert!(!it.advance());
        }
    }
}
