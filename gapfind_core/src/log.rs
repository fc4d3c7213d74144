/*!
# Gap Find: Dump Log
*/

use crate::{
	DumpEvent,
	DumpObserver,
};
use dactyl::NiceElapsed;
use std::{
	io::Write,
	time::Instant,
};
use utc2k::FmtUtc2k;



#[derive(Debug)]
/// # Dump Log.
///
/// This is a simple append-only log of timestamped events, printed to STDOUT
/// en masse when flushed (or dropped).
///
/// Doing it this way, versus printing each line in realtime, keeps the output
/// from tripping over any progress bars that might be running on STDERR.
pub struct DumpLog {
	start: Instant,
	entries: Vec<(FmtUtc2k, DumpEvent)>,
}

impl Default for DumpLog {
	fn default() -> Self { Self::new() }
}

impl Drop for DumpLog {
	/// # Final Print Maybe.
	fn drop(&mut self) { self.flush(); }
}

impl DumpObserver for DumpLog {
	fn notify(&mut self, event: DumpEvent) {
		if ! event.is_progress() {
			self.entries.push((FmtUtc2k::now(), event));
		}
	}
}

impl DumpLog {
	#[must_use]
	/// # New Instance.
	pub fn new() -> Self {
		Self {
			start: Instant::now(),
			entries: Vec::new(),
		}
	}

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	#[must_use]
	/// # Length.
	pub fn len(&self) -> usize { self.entries.len() }

	/// # Write To.
	///
	/// Write the pending entries to `handle`, draining them.
	///
	/// ## Errors
	///
	/// This bubbles up any I/O errors.
	pub fn write_to<W: Write>(&mut self, handle: &mut W) -> std::io::Result<()> {
		if self.entries.is_empty() { return Ok(()); }

		let warnings = self.entries.iter()
			.filter(|(_, e)| matches!(e.severity(), crate::Severity::Warning))
			.count();
		writeln!(
			handle,
			r"##
## Elapsed:  {}
## Entries:  {}
## Warnings: {warnings}
##",
			NiceElapsed::from(self.start),
			self.entries.len(),
		)?;

		for (time, event) in self.entries.drain(..) {
			writeln!(handle, "[{time}] {:<7} {event}", event.severity().as_str())?;
		}

		handle.flush()
	}

	/// # Flush.
	fn flush(&mut self) {
		let writer = std::io::stdout();
		let mut handle = writer.lock();
		let _res = self.write_to(&mut handle);
	}
}
