//! `ufs-core` implements the on-disk layout and the metadata-preserving
//! operations of a small Unix-style filesystem that lives inside a single
//! fixed-size disk-image file.
//!
//! The crate is organised leaves-first, mirroring the four collaborating
//! layers of the design:
//!
//! - [`device`]: the block device port the core is built against, plus the
//!   two concrete adapters (`MemDevice`, `FileDevice`) used by the tests and
//!   the command line tools.
//! - [`layout`]: the on-disk geometry, as encoded in the superblock.
//! - [`bitmap`]: the allocator primitives shared by the inode and data
//!   bitmaps.
//! - [`inode`] / [`dirent`]: the two on-disk record types.
//! - [`fs`]: the six public operations (`stat`, `lookup`, `read`, `write`,
//!   `create`, `unlink`).

pub mod bitmap;
pub mod device;
pub mod dirent;
pub mod error;
pub mod fs;
pub mod inode;
pub mod layout;

pub use device::{BlockDevice, BLOCK_SIZE};
pub use dirent::{DirEntry, DIR_ENT_NAME_SIZE, ENTRY_SIZE};
pub use error::{Error, Result};
pub use fs::{Filesystem, Stat};
pub use inode::{Inode, InodeType, DIRECT_PTRS, MAX_FILE_SIZE};
pub use layout::{Superblock, UFS_ROOT_DIRECTORY_INODE_NUMBER};
