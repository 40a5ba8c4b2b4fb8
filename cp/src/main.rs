//! `ufs-cp` copies a host file's full content into a single ufs inode.

use std::env;
use std::fs::{self, OpenOptions};
use std::process::exit;

use ufs_core::device::FileDevice;
use ufs_core::Filesystem;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in the command line.
	prog: String,
	/// Path to the ufs image.
	image_path: Option<String>,
	/// Path to the host file to copy in.
	src_path: Option<String>,
	/// The destination inode number.
	inode_number: Option<i32>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "ufs-cp".to_owned());
	args.image_path = iter.next();
	args.src_path = iter.next();
	args.inode_number = iter.next().and_then(|s| s.parse().ok());

	args
}

fn main() {
	env_logger::init();
	let args = parse_args();

	let usage = "usage: ufs-cp <image> <host-file> <inode>";
	let image_path = args.image_path.unwrap_or_else(|| ufs_support::error(&args.prog, usage));
	let src_path = args.src_path.unwrap_or_else(|| ufs_support::error(&args.prog, usage));
	let inode_number = args.inode_number.unwrap_or_else(|| ufs_support::error(&args.prog, usage));

	let data = fs::read(&src_path).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{src_path}: {e}"))
	});

	let file = OpenOptions::new().read(true).write(true).open(&image_path).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});
	let dev = FileDevice::new(file);
	let mut fs = Filesystem::mount(dev).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});

	let n = fs.write(inode_number, &data).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("inode {inode_number}: {e}"))
	});
	log::debug!("wrote {n} bytes to inode {inode_number}");
	exit(0);
}
