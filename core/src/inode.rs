//! The inode record: type, size, and direct block pointers.

use crate::device::BLOCK_SIZE;

/// Number of direct data-block pointers an inode carries. There is no
/// indirection: a file larger than `DIRECT_PTRS` blocks cannot be
/// represented.
pub const DIRECT_PTRS: usize = 30;

/// The largest file size representable by an inode, in bytes.
pub const MAX_FILE_SIZE: u32 = (DIRECT_PTRS * BLOCK_SIZE) as u32;

/// On-disk size of one inode record: a `u32` type tag, a `u32` size, and
/// `DIRECT_PTRS` `u32` pointers.
pub const INODE_SIZE: usize = 4 + 4 + DIRECT_PTRS * 4;

/// How many inode records fit in one block.
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// The number of blocks needed to hold `count` inodes.
pub fn blocks_for_inodes(count: u32) -> u32 {
	ufs_support::util::ceil_division(count as u64, INODES_PER_BLOCK as u64) as u32
}

/// The kind of file an inode describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
	Regular,
	Directory,
}

impl InodeType {
	/// The on-disk type tag: regular = 1, directory = 2.
	pub fn to_raw(self) -> u32 {
		match self {
			Self::Regular => 1,
			Self::Directory => 2,
		}
	}

	/// Decodes an on-disk type tag, if it names a known type.
	pub fn from_raw(raw: u32) -> Option<Self> {
		match raw {
			1 => Some(Self::Regular),
			2 => Some(Self::Directory),
			_ => None,
		}
	}
}

/// An inode record, decoded from its on-disk bytes.
///
/// `kind` is `None` when the on-disk type tag isn't one of the two known
/// values; this happens for inodes nobody has allocated yet, and the
/// filesystem layer treats that the same as "not allocated" rather than
/// trying to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
	pub kind: Option<InodeType>,
	pub size: u32,
	pub direct: [u32; DIRECT_PTRS],
}

impl Inode {
	/// An inode record with no type, zero size, and no block pointers.
	pub const fn empty() -> Self {
		Self {
			kind: None,
			size: 0,
			direct: [0; DIRECT_PTRS],
		}
	}

	/// Creates a freshly-allocated inode of the given type.
	pub const fn new(kind: InodeType) -> Self {
		Self {
			kind: Some(kind),
			size: 0,
			direct: [0; DIRECT_PTRS],
		}
	}

	/// Decodes an inode record from a fixed-size byte slice.
	pub fn decode(bytes: &[u8]) -> Self {
		debug_assert_eq!(bytes.len(), INODE_SIZE);
		let raw_kind = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
		let size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
		let mut direct = [0u32; DIRECT_PTRS];
		for (i, slot) in direct.iter_mut().enumerate() {
			let off = 8 + i * 4;
			*slot = u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
		}
		Self {
			kind: InodeType::from_raw(raw_kind),
			size,
			direct,
		}
	}

	/// Encodes the inode record into a fixed-size byte slice.
	pub fn encode(&self, out: &mut [u8]) {
		debug_assert_eq!(out.len(), INODE_SIZE);
		let raw_kind = self.kind.map(InodeType::to_raw).unwrap_or(0);
		out[0..4].copy_from_slice(&raw_kind.to_le_bytes());
		out[4..8].copy_from_slice(&self.size.to_le_bytes());
		for (i, slot) in self.direct.iter().enumerate() {
			let off = 8 + i * 4;
			out[off..off + 4].copy_from_slice(&slot.to_le_bytes());
		}
	}

	/// Number of data blocks currently reserved for `size` bytes of content.
	pub fn blocks_in_use(&self) -> u32 {
		ufs_support::util::ceil_division(self.size as u64, BLOCK_SIZE as u64) as u32
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn roundtrip() {
		let mut inode = Inode::new(InodeType::Regular);
		inode.size = 9000;
		inode.direct[0] = 7;
		inode.direct[1] = 8;

		let mut buf = [0u8; INODE_SIZE];
		inode.encode(&mut buf);
		let decoded = Inode::decode(&buf);
		assert_eq!(inode, decoded);
	}

	#[test]
	fn unallocated_decodes_to_no_type() {
		let buf = [0u8; INODE_SIZE];
		let decoded = Inode::decode(&buf);
		assert_eq!(decoded.kind, None);
	}

	#[test]
	fn inode_size_is_128_bytes() {
		assert_eq!(INODE_SIZE, 128);
		assert_eq!(INODES_PER_BLOCK, 32);
	}
}
