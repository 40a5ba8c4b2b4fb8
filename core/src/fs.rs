//! The six public, metadata-preserving operations: `stat`, `lookup`,
//! `read`, `write`, `create`, `unlink`.
//!
//! Every mutating operation is wrapped in a single device transaction: the
//! algorithm computes its whole result against in-memory copies of the
//! bitmaps and inode/dirent records it touches, and only calls
//! `write_block` once every check has already passed. A failure partway
//! through never leaves a partially-applied change sitting in the
//! transaction buffer — there is simply nothing to roll back by the time an
//! error can occur. `begin_transaction`/`commit`/`rollback` are still used
//! at the edges so the device sees the same transaction discipline a
//! multi-block mutation would need if it ever stopped being computed this
//! way.

use crate::bitmap::Bitmap;
use crate::device::{BlockDevice, BLOCK_SIZE};
use crate::dirent::{DirEntry, DIR_ENT_NAME_SIZE, ENTRY_SIZE};
use crate::error::{Error, Result};
use crate::inode::{Inode, InodeType, DIRECT_PTRS, INODES_PER_BLOCK, INODE_SIZE, MAX_FILE_SIZE};
use crate::layout::Superblock;

const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / ENTRY_SIZE;

/// Metadata returned by [`Filesystem::stat`].
///
/// `direct` carries every one of the inode's `DIRECT_PTRS` pointer slots, not
/// just the ones currently in use; a caller walks `direct[0..blocks]`, where
/// `blocks = ceil(size / BLOCK_SIZE)`, to get the file's actual block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
	pub kind: InodeType,
	pub size: u32,
	pub direct: [u32; DIRECT_PTRS],
}

/// A mounted filesystem: a superblock plus the device it describes.
pub struct Filesystem<D> {
	dev: D,
	sb: Superblock,
}

impl<D: BlockDevice> Filesystem<D> {
	/// Mounts the filesystem described by the superblock at block 0 of
	/// `dev`, validating that its regions are well-formed.
	pub fn mount(mut dev: D) -> Result<Self> {
		let sb = Superblock::read(&mut dev)?;
		log::debug!(
			"mounted ufs image: {} inodes, {} data blocks",
			sb.num_inodes,
			sb.num_data
		);
		Ok(Self { dev, sb })
	}

	/// Consumes the filesystem, returning the underlying device.
	pub fn into_device(self) -> D {
		self.dev
	}

	// -- shared prelude -----------------------------------------------

	fn inode_bitmap(&mut self) -> Bitmap {
		Bitmap::read(&mut self.dev, self.sb.inode_bitmap_addr, self.sb.inode_bitmap_len)
	}

	fn data_bitmap(&mut self) -> Bitmap {
		Bitmap::read(&mut self.dev, self.sb.data_bitmap_addr, self.sb.data_bitmap_len)
	}

	fn read_inode_record(&mut self, inum: i32) -> Inode {
		let mut buf = [0u8; BLOCK_SIZE];
		self.dev.read_block(self.sb.inode_block_addr(inum), &mut buf);
		let off = self.sb.inode_block_offset(inum);
		Inode::decode(&buf[off..off + INODE_SIZE])
	}

	fn write_inode_record(&mut self, inum: i32, inode: &Inode) {
		let addr = self.sb.inode_block_addr(inum);
		let off = self.sb.inode_block_offset(inum);
		let mut buf = [0u8; BLOCK_SIZE];
		self.dev.read_block(addr, &mut buf);
		inode.encode(&mut buf[off..off + INODE_SIZE]);
		self.dev.write_block(addr, &buf);
	}

	/// Validates `inum` is in range and allocated, and returns its inode.
	fn load_allocated_inode(&mut self, inum: i32) -> Result<Inode> {
		if !self.sb.inode_in_range(inum) {
			return Err(Error::InvalidInode);
		}
		if !self.inode_bitmap().is_set(inum as u32) {
			return Err(Error::NotAllocated);
		}
		Ok(self.read_inode_record(inum))
	}

	/// Same as [`Self::load_allocated_inode`], but additionally requires the
	/// inode to be a directory.
	fn load_directory(&mut self, inum: i32) -> Result<Inode> {
		let inode = self.load_allocated_inode(inum)?;
		match inode.kind {
			Some(InodeType::Directory) => Ok(inode),
			_ => Err(Error::InvalidInode),
		}
	}

	/// Reads the `relative_block`'th data block of `inode`. `direct[i]` is
	/// stored as an absolute block address, so this is a direct device read.
	fn read_block_of(&mut self, inode: &Inode, relative_block: u32, buf: &mut [u8; BLOCK_SIZE]) {
		let addr = inode.direct[relative_block as usize];
		self.dev.read_block(addr, buf);
	}

	/// Decodes the directory's logical entries: exactly `size / ENTRY_SIZE`
	/// of them, packed hole-free from offset 0 (I2). Any padding past
	/// `size` within the last allocated block is not part of the
	/// directory's logical content.
	fn read_directory_entries(&mut self, inode: &Inode) -> Vec<DirEntry> {
		let count = inode.size as usize / ENTRY_SIZE;
		let nblocks = inode.blocks_in_use();
		let mut out = Vec::with_capacity(count);
		let mut buf = [0u8; BLOCK_SIZE];
		'blocks: for b in 0..nblocks {
			self.read_block_of(inode, b, &mut buf);
			for chunk in buf.chunks(ENTRY_SIZE) {
				if out.len() == count {
					break 'blocks;
				}
				out.push(DirEntry::decode(chunk));
			}
		}
		out
	}

	fn validate_name(name: &str) -> Result<()> {
		let len = name.as_bytes().len();
		if len == 0 || len >= DIR_ENT_NAME_SIZE {
			return Err(Error::InvalidName);
		}
		Ok(())
	}

	// -- public operations ----------------------------------------------

	/// Returns the type and size of `inum`.
	pub fn stat(&mut self, inum: i32) -> Result<Stat> {
		let inode = self.load_allocated_inode(inum)?;
		let kind = inode.kind.ok_or(Error::NotAllocated)?;
		Ok(Stat { kind, size: inode.size, direct: inode.direct })
	}

	/// Resolves `name` within the directory `parent_inum`.
	pub fn lookup(&mut self, parent_inum: i32, name: &str) -> Result<i32> {
		Self::validate_name(name)?;
		let parent = self.load_directory(parent_inum)?;
		self.read_directory_entries(&parent)
			.into_iter()
			.find(|e| e.is_used() && e.name_str() == name)
			.map(|e| e.inode)
			.ok_or(Error::NotFound)
	}

	/// Reads up to `buf.len()` bytes of `inum`'s content, starting at
	/// offset 0, and returns the number of bytes copied.
	///
	/// A directory's content is its raw, on-disk entry records: callers
	/// that want directory listings read the whole thing and decode
	/// `ENTRY_SIZE`-byte chunks into [`DirEntry`]s themselves. `buf` must
	/// then be an exact multiple of `ENTRY_SIZE`.
	pub fn read(&mut self, inum: i32, buf: &mut [u8]) -> Result<u32> {
		let inode = self.load_allocated_inode(inum)?;
		if inode.kind == Some(InodeType::Directory) && buf.len() % ENTRY_SIZE != 0 {
			return Err(Error::InvalidSize);
		}

		let to_read = buf.len().min(inode.size as usize);
		let mut block_buf = [0u8; BLOCK_SIZE];
		let mut copied = 0usize;
		let mut relative_block = 0u32;
		while copied < to_read {
			if inode.direct[relative_block as usize] == 0 {
				// A zero direct pointer means there's no block here to read:
				// stop and return what's actually been copied rather than
				// reading the superblock.
				break;
			}
			self.read_block_of(&inode, relative_block, &mut block_buf);
			let chunk = (to_read - copied).min(BLOCK_SIZE);
			buf[copied..copied + chunk].copy_from_slice(&block_buf[..chunk]);
			copied += chunk;
			relative_block += 1;
		}
		Ok(copied as u32)
	}

	/// Replaces the entire content of `inum` with `data`.
	///
	/// This is not an append: the file's size becomes exactly `data.len()`
	/// and any blocks no longer needed are released back to the data
	/// bitmap.
	pub fn write(&mut self, inum: i32, data: &[u8]) -> Result<u32> {
		if data.len() > MAX_FILE_SIZE as usize {
			return Err(Error::InvalidSize);
		}
		let mut inode = self.load_allocated_inode(inum)?;
		if inode.kind != Some(InodeType::Regular) {
			return Err(Error::WriteToDir);
		}

		let old_blocks = inode.blocks_in_use();
		let new_blocks = ufs_support::util::ceil_division(data.len() as u64, BLOCK_SIZE as u64) as u32;

		self.dev.begin_transaction();

		let mut data_bm = self.data_bitmap();
		if new_blocks > old_blocks {
			let mut reserved = Vec::new();
			let mut failed = false;
			for _ in old_blocks..new_blocks {
				match data_bm.find_and_reserve(self.sb.num_data) {
					Some(b) => reserved.push(b),
					None => {
						failed = true;
						break;
					}
				}
			}
			if failed {
				self.dev.rollback();
				return Err(Error::NotEnoughSpace);
			}
			for (i, b) in reserved.into_iter().enumerate() {
				inode.direct[old_blocks as usize + i] = self.sb.data_block_addr(b);
			}
		} else {
			for i in new_blocks..old_blocks {
				data_bm.clear(self.sb.data_block_bit(inode.direct[i as usize]));
				inode.direct[i as usize] = 0;
			}
		}

		for (i, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
			let mut buf = [0u8; BLOCK_SIZE];
			buf[..chunk.len()].copy_from_slice(chunk);
			self.dev.write_block(inode.direct[i], &buf);
		}

		inode.size = data.len() as u32;
		self.write_inode_record(inum, &inode);
		data_bm.write(&mut self.dev);
		self.dev.commit();

		Ok(data.len() as u32)
	}

	/// Creates an entry named `name` of type `kind` within directory
	/// `parent_inum`.
	///
	/// If an entry with that name already exists and is of the same type,
	/// `create` is idempotent and returns its inode number without
	/// allocating anything new. An existing entry of a *different* type is
	/// [`Error::InvalidType`].
	pub fn create(&mut self, parent_inum: i32, kind: InodeType, name: &str) -> Result<i32> {
		Self::validate_name(name)?;
		let mut parent = self.load_directory(parent_inum)?;

		let entries = self.read_directory_entries(&parent);
		if let Some(existing) = entries.iter().find(|e| e.is_used() && e.name_str() == name) {
			let existing_inode = self.read_inode_record(existing.inode);
			return if existing_inode.kind == Some(kind) {
				Ok(existing.inode)
			} else {
				Err(Error::InvalidType)
			};
		}

		self.dev.begin_transaction();

		let mut inode_bm = self.inode_bitmap();
		let new_inum = match inode_bm.find_and_reserve(self.sb.num_inodes) {
			Some(n) => n as i32,
			None => {
				self.dev.rollback();
				return Err(Error::NotEnoughSpace);
			}
		};

		let mut data_bm = self.data_bitmap();
		let mut child = Inode::new(kind);

		if kind == InodeType::Directory {
			let block = match data_bm.find_and_reserve(self.sb.num_data) {
				Some(b) => b,
				None => {
					self.dev.rollback();
					return Err(Error::NotEnoughSpace);
				}
			};
			let block_addr = self.sb.data_block_addr(block);
			child.direct[0] = block_addr;
			child.size = 2 * ENTRY_SIZE as u32;

			let mut buf = [0u8; BLOCK_SIZE];
			let mut dot = DirEntry::new(".", new_inum).unwrap();
			dot.encode(&mut buf[0..ENTRY_SIZE]);
			let mut dotdot = DirEntry::new("..", parent_inum).unwrap();
			dotdot.encode(&mut buf[ENTRY_SIZE..2 * ENTRY_SIZE]);
			for slot in buf[2 * ENTRY_SIZE..].chunks_mut(ENTRY_SIZE) {
				DirEntry::empty().encode(slot);
			}
			self.dev.write_block(block_addr, &buf);
		}

		// Find a free slot in the parent's existing directory blocks first.
		let mut placed = false;
		let nblocks = parent.blocks_in_use();
		'outer: for b in 0..nblocks {
			let mut buf = [0u8; BLOCK_SIZE];
			self.read_block_of(&parent, b, &mut buf);
			for slot in buf.chunks_mut(ENTRY_SIZE) {
				if DirEntry::decode(slot).is_used() {
					continue;
				}
				DirEntry::new(name, new_inum).unwrap().encode(slot);
				self.dev.write_block(parent.direct[b as usize], &buf);
				parent.size += ENTRY_SIZE as u32;
				placed = true;
				break 'outer;
			}
		}

		if !placed {
			if nblocks as usize >= DIRECT_PTRS {
				self.dev.rollback();
				return Err(Error::NotEnoughSpace);
			}
			let block = match data_bm.find_and_reserve(self.sb.num_data) {
				Some(b) => b,
				None => {
					self.dev.rollback();
					return Err(Error::NotEnoughSpace);
				}
			};
			let block_addr = self.sb.data_block_addr(block);
			parent.direct[nblocks as usize] = block_addr;
			parent.size += ENTRY_SIZE as u32;

			let mut buf = [0u8; BLOCK_SIZE];
			DirEntry::new(name, new_inum).unwrap().encode(&mut buf[0..ENTRY_SIZE]);
			for slot in buf[ENTRY_SIZE..].chunks_mut(ENTRY_SIZE) {
				DirEntry::empty().encode(slot);
			}
			self.dev.write_block(block_addr, &buf);
		}

		self.write_inode_record(new_inum, &child);
		self.write_inode_record(parent_inum, &parent);
		inode_bm.write(&mut self.dev);
		data_bm.write(&mut self.dev);
		self.dev.commit();

		log::debug!("created inode {new_inum} ({name:?}) in directory {parent_inum}");
		Ok(new_inum)
	}

	/// Removes the entry named `name` from directory `parent_inum`, freeing
	/// its inode and data blocks.
	pub fn unlink(&mut self, parent_inum: i32, name: &str) -> Result<()> {
		Self::validate_name(name)?;
		if name == "." || name == ".." {
			return Err(Error::UnlinkNotAllowed);
		}
		let mut parent = self.load_directory(parent_inum)?;

		let entries = self.read_directory_entries(&parent);
		let (slot_index, target) = entries
			.iter()
			.enumerate()
			.find(|(_, e)| e.is_used() && e.name_str() == name)
			.map(|(i, e)| (i, *e))
			.ok_or(Error::NotFound)?;

		let target_inode = self.read_inode_record(target.inode);
		if target_inode.kind == Some(InodeType::Directory) {
			let live = self
				.read_directory_entries(&target_inode)
				.into_iter()
				.filter(|e| e.is_used() && e.name_str() != "." && e.name_str() != "..")
				.count();
			if live > 0 {
				return Err(Error::DirNotEmpty);
			}
		}

		self.dev.begin_transaction();

		let mut inode_bm = self.inode_bitmap();
		let mut data_bm = self.data_bitmap();

		for b in 0..target_inode.blocks_in_use() {
			data_bm.clear(self.sb.data_block_bit(target_inode.direct[b as usize]));
		}
		inode_bm.clear(target.inode as u32);
		self.write_inode_record(target.inode, &Inode::empty());

		// `entries` is size-bounded (read() never returns past inode.size),
		// so by I2 every slot in it is in use: the last one is always the
		// tail of the packed, hole-free sequence.
		let last_index = entries.len() - 1;
		if last_index != slot_index {
			let replacement = entries[last_index];
			self.write_entry_at(&parent, slot_index, &replacement);
		}
		self.write_entry_at(&parent, last_index, &DirEntry::empty());

		parent.size -= ENTRY_SIZE as u32;
		if parent.size % BLOCK_SIZE as u32 == 0 {
			// The entry just removed was the sole occupant of what was the
			// directory's last block: the new block count is exactly that
			// block's index, since blocks are 0-indexed.
			let freed_block = parent.blocks_in_use();
			data_bm.clear(self.sb.data_block_bit(parent.direct[freed_block as usize]));
			parent.direct[freed_block as usize] = 0;
		}
		self.write_inode_record(parent_inum, &parent);

		inode_bm.write(&mut self.dev);
		data_bm.write(&mut self.dev);
		self.dev.commit();

		log::debug!("unlinked {name:?} (inode {}) from directory {parent_inum}", target.inode);
		Ok(())
	}

	fn write_entry_at(&mut self, dir_inode: &Inode, entry_index: usize, entry: &DirEntry) {
		let relative_block = (entry_index / ENTRIES_PER_BLOCK) as u32;
		let offset_in_block = (entry_index % ENTRIES_PER_BLOCK) * ENTRY_SIZE;
		let mut buf = [0u8; BLOCK_SIZE];
		self.read_block_of(dir_inode, relative_block, &mut buf);
		entry.encode(&mut buf[offset_in_block..offset_in_block + ENTRY_SIZE]);
		self.dev
			.write_block(self.sb.data_block_addr(dir_inode.direct[relative_block as usize]), &buf);
	}
}

#[allow(dead_code)]
const fn _assert_inodes_per_block_matches_layout() {
	assert!(INODES_PER_BLOCK == 32);
}
