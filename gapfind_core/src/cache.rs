/*!
# Gap Find: Cache
*/

use cdtoc::Toc;
use crate::{
	CACHE_BASE,
	GapError,
};
use std::{
	fs::File,
	io::{
		BufWriter,
		Write,
	},
	path::{
		Path,
		PathBuf,
	},
	sync::OnceLock,
};
use tempfile::NamedTempFile;



/// # Cache Root.
///
/// This will ultimately hold `CWD/CACHE_BASE`.
static CACHE_ROOT: OnceLock<Option<PathBuf>> = OnceLock::new();



/// # Cache Writer.
///
/// Data is written to a temporary file in the destination's directory, then
/// moved into place once complete, so a partial write can never clobber an
/// earlier good copy.
pub(crate) struct CacheWriter<'a> {
	/// # Destination.
	dst: &'a Path,

	/// # Temporary File.
	tmp: BufWriter<NamedTempFile>,
}

impl<'a> CacheWriter<'a> {
	/// # New.
	///
	/// ## Errors
	///
	/// This will return an error if the temporary file cannot be created.
	pub(crate) fn new(dst: &'a Path) -> Result<Self, GapError> {
		let dir = dst.parent().ok_or(GapError::Write)?;
		if ! dir.is_dir() {
			std::fs::create_dir_all(dir).map_err(|_| GapError::Write)?;
		}

		let tmp = NamedTempFile::new_in(dir).map_err(|_| GapError::Write)?;
		Ok(Self {
			dst,
			tmp: BufWriter::new(tmp),
		})
	}

	/// # Writer.
	pub(crate) fn writer(&mut self) -> &mut BufWriter<NamedTempFile> { &mut self.tmp }

	/// # Finish.
	///
	/// Flush the temporary file and move it into place.
	///
	/// ## Errors
	///
	/// This will return an error if the data cannot be flushed or the file
	/// cannot be persisted.
	pub(crate) fn finish(self) -> Result<File, GapError> {
		self.tmp.into_inner()
			.map_err(|_| GapError::Write)?
			.persist(self.dst)
			.map_err(|_| GapError::Write)
	}
}



/// # Cache Path.
///
/// Return the disc-specific cache path for `file`, i.e.
/// `CWD/CACHE_BASE/CDDB_ID/file`.
///
/// ## Errors
///
/// This will return an error if the cache root cannot be established.
pub(crate) fn cache_path(toc: &Toc, file: &str) -> Result<PathBuf, GapError> {
	let root = cache_root()?;
	Ok(root.join(toc.cddb_id().to_string()).join(file))
}

/// # Write to Cache.
///
/// Write a file to the cache, replacing the original if it exists.
///
/// ## Errors
///
/// This will return an error if the cache root cannot be established or if
/// there are problems writing this specific file.
pub(crate) fn cache_write(toc: &Toc, file: &str, data: &[u8]) -> Result<PathBuf, GapError> {
	let dst = cache_path(toc, file)?;
	let mut writer = CacheWriter::new(&dst)?;
	writer.writer().write_all(data).map_err(|_| GapError::Write)?;
	writer.finish()?;
	Ok(dst)
}

/// # Cache Root.
///
/// Return the canonical cache root for the program, creating it if it doesn't
/// already exist.
///
/// ## Errors
///
/// This will return an error if the path cannot be determined or the current
/// working directory does not exist.
fn cache_root() -> Result<&'static Path, GapError> {
	let out = CACHE_ROOT.get_or_init(|| {
		// The base must already exist.
		let dir = std::env::current_dir().ok()?;
		if ! dir.is_dir() { return None; }

		// Our root.
		let dir = dir.join(CACHE_BASE);

		// Make it if necessary.
		if ! dir.is_dir() {
			std::fs::create_dir_all(&dir).ok()?;
		}

		// Make sure it is really there.
		std::fs::canonicalize(dir).ok()
	})
		.as_deref()
		.ok_or(GapError::Cache)?;

	if out.is_dir() { Ok(out) }
	// It seems to have vanished; try to recreate it.
	else {
		std::fs::create_dir_all(out).map_err(|_| GapError::Cache)?;
		if out.is_dir() { Ok(out) }
		else { Err(GapError::Cache) }
	}
}
