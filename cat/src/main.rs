//! `ufs-cat` prints an inode's direct block list, then its raw content.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::process::exit;

use ufs_core::device::FileDevice;
use ufs_core::inode::InodeType;
use ufs_core::{Filesystem, BLOCK_SIZE};

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in the command line.
	prog: String,
	/// Path to the ufs image.
	image_path: Option<String>,
	/// The inode number to print.
	inode_number: Option<i32>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or_else(|| "ufs-cat".to_owned());

	args.image_path = iter.next();
	args.inode_number = iter.next().and_then(|s| s.parse().ok());

	args
}

fn main() {
	env_logger::init();
	let args = parse_args();

	let image_path = args.image_path.unwrap_or_else(|| {
		ufs_support::error(&args.prog, "usage: ufs-cat <image> <inode>")
	});
	let inode_number = args.inode_number.unwrap_or_else(|| {
		ufs_support::error(&args.prog, "usage: ufs-cat <image> <inode>")
	});

	let file = OpenOptions::new().read(true).open(&image_path).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});
	let dev = FileDevice::new(file);
	let mut fs = Filesystem::mount(dev).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("{image_path}: {e}"))
	});

	let stat = fs.stat(inode_number).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("inode {inode_number}: {e}"))
	});
	if stat.kind == InodeType::Directory {
		ufs_support::error(&args.prog, format!("inode {inode_number} is a directory"));
	}

	let num_blocks = ufs_support::util::ceil_division(stat.size as u64, BLOCK_SIZE as u64);
	println!("File blocks");
	for i in 0..num_blocks as usize {
		println!("{}", stat.direct[i]);
	}
	println!();

	let mut buf = vec![0u8; stat.size as usize];
	let n = fs.read(inode_number, &mut buf).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, format!("inode {inode_number}: {e}"))
	});

	println!("File data");
	let stdout = io::stdout();
	let mut out = stdout.lock();
	out.write_all(&buf[..n as usize]).unwrap_or_else(|e| {
		ufs_support::error(&args.prog, e);
	});
	exit(0);
}
