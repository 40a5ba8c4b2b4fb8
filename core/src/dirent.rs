//! Directory entries: a fixed-width name plus the inode number it names.

/// Maximum length of a directory entry name, including any NUL padding.
pub const DIR_ENT_NAME_SIZE: usize = 28;

/// On-disk size of one directory entry: `DIR_ENT_NAME_SIZE` name bytes plus
/// an `i32` inode number.
pub const ENTRY_SIZE: usize = DIR_ENT_NAME_SIZE + 4;

/// A decoded directory entry.
///
/// `inode == -1` marks a slot as unused; the name bytes of an unused slot
/// are not meaningful and must not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
	pub name: [u8; DIR_ENT_NAME_SIZE],
	pub inode: i32,
}

impl DirEntry {
	/// The sentinel `inode` value of an unused slot.
	pub const FREE: i32 = -1;

	/// An empty, unused slot.
	pub const fn empty() -> Self {
		Self {
			name: [0; DIR_ENT_NAME_SIZE],
			inode: Self::FREE,
		}
	}

	/// Builds an entry for `name` pointing at `inode`.
	///
	/// Returns `None` if `name` is empty or does not fit in
	/// `DIR_ENT_NAME_SIZE` bytes including a NUL terminator.
	pub fn new(name: &str, inode: i32) -> Option<Self> {
		let bytes = name.as_bytes();
		if bytes.is_empty() || bytes.len() >= DIR_ENT_NAME_SIZE {
			return None;
		}
		let mut buf = [0u8; DIR_ENT_NAME_SIZE];
		buf[..bytes.len()].copy_from_slice(bytes);
		Some(Self { name: buf, inode })
	}

	/// Whether this slot currently names an entry.
	pub fn is_used(&self) -> bool {
		self.inode != Self::FREE
	}

	/// The entry's name, up to the first NUL byte.
	pub fn name_str(&self) -> &str {
		let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
		std::str::from_utf8(&self.name[..end]).unwrap_or("")
	}

	/// Decodes a directory entry from a fixed-size byte slice.
	pub fn decode(bytes: &[u8]) -> Self {
		debug_assert_eq!(bytes.len(), ENTRY_SIZE);
		let mut name = [0u8; DIR_ENT_NAME_SIZE];
		name.copy_from_slice(&bytes[0..DIR_ENT_NAME_SIZE]);
		let inode = i32::from_le_bytes(
			bytes[DIR_ENT_NAME_SIZE..ENTRY_SIZE].try_into().unwrap(),
		);
		Self { name, inode }
	}

	/// Encodes the directory entry into a fixed-size byte slice.
	pub fn encode(&self, out: &mut [u8]) {
		debug_assert_eq!(out.len(), ENTRY_SIZE);
		out[0..DIR_ENT_NAME_SIZE].copy_from_slice(&self.name);
		out[DIR_ENT_NAME_SIZE..ENTRY_SIZE].copy_from_slice(&self.inode.to_le_bytes());
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn roundtrip() {
		let ent = DirEntry::new("hello.txt", 3).unwrap();
		let mut buf = [0u8; ENTRY_SIZE];
		ent.encode(&mut buf);
		let decoded = DirEntry::decode(&buf);
		assert_eq!(ent, decoded);
		assert_eq!(decoded.name_str(), "hello.txt");
	}

	#[test]
	fn rejects_empty_name() {
		assert!(DirEntry::new("", 3).is_none());
	}

	#[test]
	fn rejects_oversized_name() {
		let name = "x".repeat(DIR_ENT_NAME_SIZE);
		assert!(DirEntry::new(&name, 3).is_none());
	}

	#[test]
	fn entry_size_is_32_bytes() {
		assert_eq!(ENTRY_SIZE, 32);
	}
}
