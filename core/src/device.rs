//! The block device port.
//!
//! This is deliberately the thinnest layer in the crate: the design treats
//! the block device as an external collaborator (§6 of the design), so
//! [`BlockDevice`] only states the contract the rest of the crate is built
//! against. The two adapters below (`MemDevice`, `FileDevice`) are ambient
//! test/CLI tooling, not "the core" — a real deployment might back this
//! trait with a raw block special file, a loopback device, or anything else
//! that can honor fixed-size reads and writes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// The fixed size, in bytes, of every block addressed on the device.
pub const BLOCK_SIZE: usize = 4096;

/// A block-addressed storage device with a single-level transaction scope.
///
/// Reads and writes are defined to be infallible within a valid image: a
/// conforming implementation panics (or aborts) if asked to touch a block
/// number outside of the image, rather than surfacing an `Err` the six
/// public operations would need to thread through every call site.
pub trait BlockDevice {
	/// Reads block `block_no` into `buf`.
	fn read_block(&mut self, block_no: u32, buf: &mut [u8; BLOCK_SIZE]);

	/// Writes `buf` to block `block_no`.
	fn write_block(&mut self, block_no: u32, buf: &[u8; BLOCK_SIZE]);

	/// The number of `BLOCK_SIZE` blocks the device holds.
	fn block_count(&self) -> u32;

	/// Opens a transaction. Until `commit` or `rollback`, writes are held by
	/// the device rather than made visible on the backing storage, though
	/// they remain visible to reads issued by the same caller (read-your-
	/// writes).
	fn begin_transaction(&mut self);

	/// Makes every write since the last `begin_transaction` durable.
	fn commit(&mut self);

	/// Discards every write since the last `begin_transaction`.
	fn rollback(&mut self);
}

/// An in-memory [`BlockDevice`], used by the test suite and by nothing else:
/// there is no reason to keep a ufs image in memory only, since the whole
/// point of the format is to survive the process that wrote it.
pub struct MemDevice {
	blocks: Vec<[u8; BLOCK_SIZE]>,
	pending: Option<HashMap<u32, [u8; BLOCK_SIZE]>>,
}

impl MemDevice {
	/// Creates a device of `block_count` zeroed blocks.
	pub fn new(block_count: u32) -> Self {
		Self {
			blocks: vec![[0u8; BLOCK_SIZE]; block_count as usize],
			pending: None,
		}
	}

	/// Returns the raw block contents, bypassing the transaction buffer.
	/// Intended for test assertions on committed state only.
	pub fn blocks(&self) -> &[[u8; BLOCK_SIZE]] {
		&self.blocks
	}
}

impl BlockDevice for MemDevice {
	fn read_block(&mut self, block_no: u32, buf: &mut [u8; BLOCK_SIZE]) {
		if let Some(pending) = self.pending.as_ref().and_then(|p| p.get(&block_no)) {
			*buf = *pending;
			return;
		}
		*buf = self.blocks[block_no as usize];
	}

	fn write_block(&mut self, block_no: u32, buf: &[u8; BLOCK_SIZE]) {
		match self.pending.as_mut() {
			Some(pending) => {
				pending.insert(block_no, *buf);
			}
			None => self.blocks[block_no as usize] = *buf,
		}
	}

	fn block_count(&self) -> u32 {
		self.blocks.len() as u32
	}

	fn begin_transaction(&mut self) {
		self.pending = Some(HashMap::new());
	}

	fn commit(&mut self) {
		if let Some(pending) = self.pending.take() {
			for (block_no, buf) in pending {
				self.blocks[block_no as usize] = buf;
			}
		}
	}

	fn rollback(&mut self) {
		self.pending = None;
	}
}

/// A [`BlockDevice`] backed by a host file, the way a real ufs image is used
/// on disk: a fixed-size file opened once, seeked to and read/written in
/// `BLOCK_SIZE` chunks.
pub struct FileDevice {
	file: File,
	block_count: u32,
	pending: Option<HashMap<u32, [u8; BLOCK_SIZE]>>,
}

impl FileDevice {
	/// Wraps an already-open image file. The file's current length, rounded
	/// down to a block, becomes the device's fixed block count.
	pub fn new(file: File) -> Self {
		let len = file.metadata().map(|m| m.len()).unwrap_or(0);
		let block_count = (len / BLOCK_SIZE as u64) as u32;
		Self {
			file,
			block_count,
			pending: None,
		}
	}

	fn read_from_disk(&mut self, block_no: u32, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()> {
		self.file
			.seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;
		self.file.read_exact(buf)
	}

	fn write_to_disk(&mut self, block_no: u32, buf: &[u8; BLOCK_SIZE]) -> io::Result<()> {
		self.file
			.seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;
		self.file.write_all(buf)
	}
}

impl BlockDevice for FileDevice {
	fn read_block(&mut self, block_no: u32, buf: &mut [u8; BLOCK_SIZE]) {
		if let Some(pending) = self.pending.as_ref().and_then(|p| p.get(&block_no)) {
			*buf = *pending;
			return;
		}
		self.read_from_disk(block_no, buf)
			.unwrap_or_else(|e| panic!("ufs: read of block {block_no}: {e}"));
	}

	fn write_block(&mut self, block_no: u32, buf: &[u8; BLOCK_SIZE]) {
		match self.pending.as_mut() {
			Some(pending) => {
				pending.insert(block_no, *buf);
			}
			None => self
				.write_to_disk(block_no, buf)
				.unwrap_or_else(|e| panic!("ufs: write of block {block_no}: {e}")),
		}
	}

	fn block_count(&self) -> u32 {
		self.block_count
	}

	fn begin_transaction(&mut self) {
		self.pending = Some(HashMap::new());
	}

	fn commit(&mut self) {
		if let Some(pending) = self.pending.take() {
			for (block_no, buf) in pending {
				self.write_to_disk(block_no, &buf)
					.unwrap_or_else(|e| panic!("ufs: commit of block {block_no}: {e}"));
			}
		}
	}

	fn rollback(&mut self) {
		self.pending = None;
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn mem_device_roundtrip() {
		let mut dev = MemDevice::new(4);
		let mut buf = [0u8; BLOCK_SIZE];
		buf[0] = 0xAB;
		dev.write_block(1, &buf);

		let mut out = [0u8; BLOCK_SIZE];
		dev.read_block(1, &mut out);
		assert_eq!(out[0], 0xAB);
	}

	#[test]
	fn mem_device_rollback_discards_writes() {
		let mut dev = MemDevice::new(4);
		dev.begin_transaction();
		let mut buf = [0u8; BLOCK_SIZE];
		buf[0] = 1;
		dev.write_block(0, &buf);

		let mut out = [0u8; BLOCK_SIZE];
		dev.read_block(0, &mut out);
		assert_eq!(out[0], 1, "reads during a transaction see its own writes");

		dev.rollback();
		dev.read_block(0, &mut out);
		assert_eq!(out[0], 0, "rollback must discard pending writes");
	}

	#[test]
	fn mem_device_commit_applies_writes() {
		let mut dev = MemDevice::new(4);
		dev.begin_transaction();
		let mut buf = [0u8; BLOCK_SIZE];
		buf[0] = 7;
		dev.write_block(2, &buf);
		dev.commit();

		let mut out = [0u8; BLOCK_SIZE];
		dev.read_block(2, &mut out);
		assert_eq!(out[0], 7);
	}

	#[test]
	fn file_device_roundtrip() {
		let tmp = tempfile::tempfile().unwrap();
		tmp.set_len(4 * BLOCK_SIZE as u64).unwrap();
		let mut dev = FileDevice::new(tmp);

		let mut buf = [0u8; BLOCK_SIZE];
		buf[10] = 0x42;
		dev.write_block(3, &buf);

		let mut out = [0u8; BLOCK_SIZE];
		dev.read_block(3, &mut out);
		assert_eq!(out[10], 0x42);
	}
}
