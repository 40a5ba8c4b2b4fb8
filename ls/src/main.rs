//! `ufs-ls` resolves a slash-separated path within a ufs image and lists it.

use std::env;
use std::fs::OpenOptions;
use std::process::exit;

use ufs_core::device::FileDevice;
use ufs_core::dirent::{DirEntry, ENTRY_SIZE};
use ufs_core::inode::InodeType;
use ufs_core::layout::UFS_ROOT_DIRECTORY_INODE_NUMBER;
use ufs_core::Filesystem;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in the command line.
	prog: String,
	/// Path to the ufs image.
	image_path: Option<String>,
	/// The slash-separated path to resolve, relative to the root directory.
	target_path: Option<String>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "ufs-ls".to_owned());
	args.image_path = iter.next();
	args.target_path = iter.next();

	args
}

fn main() {
	env_logger::init();
	let args = parse_args();

	let usage = "usage: ufs-ls <image> <path>";
	let image_path = args.image_path.unwrap_or_else(|| ufs_support::error(&args.prog, usage));
	let target_path = args.target_path.unwrap_or_else(|| ufs_support::error(&args.prog, usage));

	let file = OpenOptions::new().read(true).open(&image_path).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});
	let dev = FileDevice::new(file);
	let mut fs = Filesystem::mount(dev).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});

	let mut inum = UFS_ROOT_DIRECTORY_INODE_NUMBER;
	let mut last_name = String::from(".");
	for component in target_path.split('/').filter(|c| !c.is_empty()) {
		inum = fs.lookup(inum, component).unwrap_or_else(|e| {
			ufs_support::error(&args.prog, format!("{target_path}: {e}"))
		});
		last_name = component.to_owned();
	}

	let stat = fs.stat(inum).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{target_path}: {e}"))
	});

	if stat.kind != InodeType::Directory {
		println!("{inum}\t{last_name}");
		exit(0);
	}

	let mut buf = vec![0u8; stat.size as usize];
	fs.read(inum, &mut buf).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{target_path}: {e}"))
	});

	let mut entries: Vec<DirEntry> = buf
		.chunks(ENTRY_SIZE)
		.map(DirEntry::decode)
		.filter(|e| e.is_used())
		.collect();
	entries.sort_by(|a, b| a.name_str().as_bytes().cmp(b.name_str().as_bytes()));

	for entry in entries {
		println!("{}\t{}", entry.inode, entry.name_str());
	}
}
