//! The on-disk geometry: the superblock and the address arithmetic derived
//! from it.
//!
//! Everything here is little-endian and tightly packed, the way the rest of
//! the crate expects — no `#[repr(C)]` reinterpretation of raw bytes, only
//! explicit `to_le_bytes`/`from_le_bytes` at the edges.

use crate::device::{BlockDevice, BLOCK_SIZE};
use crate::error::{Error, Result};

/// The inode number of the filesystem's root directory.
pub const UFS_ROOT_DIRECTORY_INODE_NUMBER: i32 = 0;

/// Number of `u32` fields the superblock is made of.
const SUPERBLOCK_FIELDS: usize = 8;

/// The geometry block, always at block 0.
///
/// Every field is the number of the first block of the region it names,
/// except `inode_count`/`data_block_count`, which are counts of *items*, not
/// blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
	pub inode_bitmap_addr: u32,
	pub inode_bitmap_len: u32,
	pub data_bitmap_addr: u32,
	pub data_bitmap_len: u32,
	pub inode_region_addr: u32,
	pub inode_region_len: u32,
	pub num_inodes: u32,
	pub num_data: u32,
}

impl Superblock {
	/// Reads and validates the superblock from block 0 of `dev`.
	///
	/// Validation only checks internal consistency (regions in order, none
	/// overlapping, everything fitting within `image_blocks`); it has no way
	/// to tell a well-formed-but-wrong superblock from a correct one.
	pub fn read(dev: &mut impl BlockDevice) -> Result<Self> {
		let image_blocks = dev.block_count();
		let mut buf = [0u8; BLOCK_SIZE];
		dev.read_block(0, &mut buf);

		let mut fields = [0u32; SUPERBLOCK_FIELDS];
		for (i, field) in fields.iter_mut().enumerate() {
			let off = i * 4;
			*field = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
		}

		let sb = Self {
			inode_bitmap_addr: fields[0],
			inode_bitmap_len: fields[1],
			data_bitmap_addr: fields[2],
			data_bitmap_len: fields[3],
			inode_region_addr: fields[4],
			inode_region_len: fields[5],
			num_inodes: fields[6],
			num_data: fields[7],
		};
		sb.validate(image_blocks)?;
		Ok(sb)
	}

	/// Serializes and writes the superblock to block 0 of `dev`.
	pub fn write(&self, dev: &mut impl BlockDevice) {
		let mut buf = [0u8; BLOCK_SIZE];
		let fields = [
			self.inode_bitmap_addr,
			self.inode_bitmap_len,
			self.data_bitmap_addr,
			self.data_bitmap_len,
			self.inode_region_addr,
			self.inode_region_len,
			self.num_inodes,
			self.num_data,
		];
		for (i, field) in fields.iter().enumerate() {
			let off = i * 4;
			buf[off..off + 4].copy_from_slice(&field.to_le_bytes());
		}
		dev.write_block(0, &buf);
	}

	fn validate(&self, image_blocks: u32) -> Result<()> {
		let regions = [
			(self.inode_bitmap_addr, self.inode_bitmap_len),
			(self.data_bitmap_addr, self.data_bitmap_len),
			(self.inode_region_addr, self.inode_region_len),
			(self.data_region_addr(), self.data_region_len()),
		];

		let mut prev_end = 1u32; // block 0 is the superblock itself
		for (addr, len) in regions {
			if len == 0 || addr < prev_end {
				return Err(Error::CorruptSuperblock);
			}
			prev_end = addr
				.checked_add(len)
				.ok_or(Error::CorruptSuperblock)?;
		}
		if prev_end > image_blocks {
			return Err(Error::CorruptSuperblock);
		}
		if self.num_inodes == 0 || self.num_data == 0 {
			return Err(Error::CorruptSuperblock);
		}
		Ok(())
	}

	/// The first block of the data region, immediately following the inode
	/// table.
	pub fn data_region_addr(&self) -> u32 {
		self.inode_region_addr + self.inode_region_len
	}

	/// The length, in blocks, of the data region: one block per bit of the
	/// data bitmap.
	pub fn data_region_len(&self) -> u32 {
		self.num_data
	}

	/// The absolute block address of inode `inum`.
	pub fn inode_block_addr(&self, inum: i32) -> u32 {
		let inodes_per_block = crate::inode::INODES_PER_BLOCK as u32;
		self.inode_region_addr + (inum as u32) / inodes_per_block
	}

	/// The byte offset of inode `inum` within its block.
	pub fn inode_block_offset(&self, inum: i32) -> usize {
		let inodes_per_block = crate::inode::INODES_PER_BLOCK;
		(inum as usize % inodes_per_block) * crate::inode::INODE_SIZE
	}

	/// The absolute block address of data block `relative` (0-based, within
	/// the data region). Inodes store this absolute address directly, never
	/// the bit index.
	pub fn data_block_addr(&self, relative: u32) -> u32 {
		self.data_region_addr() + relative
	}

	/// The data-bitmap bit index backing absolute block address `addr`.
	pub fn data_block_bit(&self, addr: u32) -> u32 {
		addr - self.data_region_addr()
	}

	/// Whether `inum` names a slot this filesystem actually has.
	pub fn inode_in_range(&self, inum: i32) -> bool {
		inum >= 0 && (inum as u32) < self.num_inodes
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::device::MemDevice;

	fn sample() -> Superblock {
		Superblock {
			inode_bitmap_addr: 1,
			inode_bitmap_len: 1,
			data_bitmap_addr: 2,
			data_bitmap_len: 1,
			inode_region_addr: 3,
			inode_region_len: 2,
			num_inodes: 64,
			num_data: 64,
		}
	}

	#[test]
	fn roundtrip() {
		let mut dev = MemDevice::new(16);
		let sb = sample();
		sb.write(&mut dev);
		let read_back = Superblock::read(&mut dev).unwrap();
		assert_eq!(sb, read_back);
	}

	#[test]
	fn rejects_overlapping_regions() {
		let mut dev = MemDevice::new(16);
		let mut sb = sample();
		sb.data_bitmap_addr = 1; // collides with the inode bitmap
		sb.write(&mut dev);
		assert_eq!(Superblock::read(&mut dev), Err(Error::CorruptSuperblock));
	}

	#[test]
	fn rejects_regions_past_image_end() {
		let mut dev = MemDevice::new(4);
		let sb = sample();
		sb.write(&mut dev);
		assert_eq!(Superblock::read(&mut dev), Err(Error::CorruptSuperblock));
	}
}
