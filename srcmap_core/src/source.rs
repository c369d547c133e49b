use std::path::Path;
use std::path::PathBuf;

use crate::SrcmapError;
use crate::SrcmapResult;

/// One candidate file supplied by the enumeration collaborator.
///
/// `from_index` marks files whose bytes must come from a version-control
/// snapshot instead of the working tree. Such files are never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
	pub path: PathBuf,
	pub from_index: bool,
}

impl FileSource {
	pub fn working_tree(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			from_index: false,
		}
	}
}

/// Byte access for scanned files.
///
/// The engine never decides how files are discovered or where their bytes
/// come from; implementations cover the working tree and version-control
/// snapshots. Reads may block on I/O, so implementations must be shareable
/// across scan workers.
pub trait FileStore: Sync {
	/// Read the full contents of a file.
	fn read(&self, source: &FileSource) -> SrcmapResult<Vec<u8>>;

	/// Overwrite a working-tree file. Implementations backed by snapshots
	/// reject writes.
	fn write(&self, path: &Path, bytes: &[u8]) -> SrcmapResult<()>;
}

/// The default [`FileStore`] reading and writing the working tree directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkingTree;

impl FileStore for WorkingTree {
	fn read(&self, source: &FileSource) -> SrcmapResult<Vec<u8>> {
		std::fs::read(&source.path).map_err(|source_err| {
			SrcmapError::FileRead {
				path: source.path.clone(),
				source: source_err,
			}
		})
	}

	fn write(&self, path: &Path, bytes: &[u8]) -> SrcmapResult<()> {
		std::fs::write(path, bytes).map_err(|source_err| {
			SrcmapError::FileWrite {
				path: path.to_path_buf(),
				source: source_err,
			}
		})
	}
}
