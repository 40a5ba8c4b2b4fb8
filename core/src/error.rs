//! The error taxonomy returned by every public operation.
//!
//! Values are stable: a front-end that only has the numeric code (as it would
//! if it were calling across an FFI boundary) can still distinguish every
//! failure kind without pulling in this crate.

use thiserror::Error;

/// A failure of one of the six public filesystem operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// The inode number is out of `[0, num_inodes)`, or a directory was
	/// expected where the inode isn't one.
	#[error("invalid inode")]
	InvalidInode,
	/// The bitmap bit for the requested inode is clear.
	#[error("inode not allocated")]
	NotAllocated,
	/// `lookup` found no entry with the requested name.
	#[error("name not found")]
	NotFound,
	/// A name was empty or `>= DIR_ENT_NAME_SIZE` bytes long.
	#[error("invalid entry name")]
	InvalidName,
	/// `create` collided with an entry of a different type, or was asked to
	/// create something other than a regular file or a directory.
	#[error("invalid file type")]
	InvalidType,
	/// A negative size, an unaligned directory read size, or a write past
	/// `MAX_FILE_SIZE`.
	#[error("invalid size")]
	InvalidSize,
	/// `write` was called on a directory inode.
	#[error("cannot write to a directory")]
	WriteToDir,
	/// `unlink` was asked to remove a non-empty directory.
	#[error("directory not empty")]
	DirNotEmpty,
	/// `unlink` was asked to remove "." or "..".
	#[error("\".\" and \"..\" cannot be unlinked")]
	UnlinkNotAllowed,
	/// No free inode or data block was available.
	#[error("not enough space")]
	NotEnoughSpace,
	/// The superblock declares regions that overlap or don't fit the image.
	#[error("corrupt superblock")]
	CorruptSuperblock,
}

impl Error {
	/// The negative return code this error corresponds to, per the ufs
	/// calling convention (non-negative results are values, negative results
	/// are errors).
	pub const fn code(self) -> i32 {
		match self {
			Self::InvalidInode => -1,
			Self::NotAllocated => -2,
			Self::NotFound => -3,
			Self::InvalidName => -4,
			Self::InvalidType => -5,
			Self::InvalidSize => -6,
			Self::WriteToDir => -7,
			Self::DirNotEmpty => -8,
			Self::UnlinkNotAllowed => -9,
			Self::NotEnoughSpace => -10,
			Self::CorruptSuperblock => -11,
		}
	}
}

/// Shorthand for the result of a public filesystem operation.
pub type Result<T> = core::result::Result<T, Error>;
