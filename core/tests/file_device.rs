//! Exercises the filesystem operations against a real file on disk, not
//! just the in-memory device the unit tests use.

use std::fs::OpenOptions;

use tempfile::NamedTempFile;
use ufs_core::bitmap::Bitmap;
use ufs_core::device::FileDevice;
use ufs_core::dirent::{DirEntry, ENTRY_SIZE};
use ufs_core::inode::{Inode, InodeType, INODE_SIZE};
use ufs_core::layout::Superblock;
use ufs_core::{BlockDevice, Filesystem, BLOCK_SIZE};

/// Writes a fresh, minimal image (one inode block, a handful of data
/// blocks, root directory already in place) to `path`.
fn write_fresh_image(path: &std::path::Path, num_inodes: u32, num_data: u32) {
	let inode_region_len = ufs_core::inode::blocks_for_inodes(num_inodes);
	let sb = Superblock {
		inode_bitmap_addr: 1,
		inode_bitmap_len: 1,
		data_bitmap_addr: 2,
		data_bitmap_len: 1,
		inode_region_addr: 3,
		inode_region_len,
		num_inodes,
		num_data,
	};
	let total_blocks = sb.data_region_addr() + sb.data_region_len();

	let file = OpenOptions::new()
		.read(true)
		.write(true)
		.create(true)
		.truncate(true)
		.open(path)
		.unwrap();
	file.set_len(total_blocks as u64 * BLOCK_SIZE as u64).unwrap();

	let mut dev = FileDevice::new(file);
	sb.write(&mut dev);

	let mut inode_bm = Bitmap::read(&mut dev, sb.inode_bitmap_addr, sb.inode_bitmap_len);
	inode_bm.set(0);
	inode_bm.write(&mut dev);

	let mut data_bm = Bitmap::read(&mut dev, sb.data_bitmap_addr, sb.data_bitmap_len);
	data_bm.set(0);
	data_bm.write(&mut dev);

	let mut root = Inode::new(InodeType::Directory);
	root.direct[0] = sb.data_block_addr(0);
	root.size = 2 * ENTRY_SIZE as u32;
	let mut buf = [0u8; BLOCK_SIZE];
	root.encode(&mut buf[0..INODE_SIZE]);
	dev.write_block(sb.inode_region_addr, &buf);

	let mut dirbuf = [0u8; BLOCK_SIZE];
	DirEntry::new(".", 0).unwrap().encode(&mut dirbuf[0..ENTRY_SIZE]);
	DirEntry::new("..", 0).unwrap().encode(&mut dirbuf[ENTRY_SIZE..2 * ENTRY_SIZE]);
	for slot in dirbuf[2 * ENTRY_SIZE..].chunks_mut(ENTRY_SIZE) {
		DirEntry::empty().encode(slot);
	}
	dev.write_block(sb.data_block_addr(0), &dirbuf);
}

#[test]
fn roundtrips_through_a_real_file() {
	let tmp = NamedTempFile::new().unwrap();
	write_fresh_image(tmp.path(), 32, 16);

	let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
	let mut fs = Filesystem::mount(FileDevice::new(file)).unwrap();

	let inum = fs.create(0, InodeType::Regular, "hello.txt").unwrap();
	fs.write(inum, b"hi from disk").unwrap();

	// Re-open the image from scratch to make sure the data actually made it
	// to the file, not just to an in-memory buffer.
	let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
	let mut fs = Filesystem::mount(FileDevice::new(file)).unwrap();

	assert_eq!(fs.lookup(0, "hello.txt").unwrap(), inum);
	let mut out = vec![0u8; 12];
	fs.read(inum, &mut out).unwrap();
	assert_eq!(&out, b"hi from disk");
}

#[test]
fn unlink_persists_across_remount() {
	let tmp = NamedTempFile::new().unwrap();
	write_fresh_image(tmp.path(), 32, 16);

	let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
	let mut fs = Filesystem::mount(FileDevice::new(file)).unwrap();
	fs.create(0, InodeType::Regular, "a").unwrap();
	fs.unlink(0, "a").unwrap();

	let file = OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap();
	let mut fs = Filesystem::mount(FileDevice::new(file)).unwrap();
	assert!(fs.lookup(0, "a").is_err());
}
