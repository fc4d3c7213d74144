/*!
# Gap Find: Events
*/

use crate::{
	SubchannelSupport,
	SubQEncoding,
};
use std::fmt;



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Dump Event.
///
/// Everything worth mentioning during a dump is reported as one of these,
/// leaving it up to the observer to decide what (if anything) to do with
/// them.
pub enum DumpEvent {
	/// # Subchannel Support Determined.
	Subchannel(SubchannelSupport),

	/// # Q Encoding Detected.
	Encoding(SubQEncoding),

	/// # Q Encoding Undetectable.
	EncodingUnknown,

	/// # Unreadable Position.
	///
	/// No CRC-valid Q could be read at this LBA after every retry.
	Unreadable(i32),

	/// # Pregap Confirmed Zero.
	ZeroPregap(u8),

	/// # Pregap Search Started.
	Search {
		/// # Track Number.
		track: u8,

		/// # Starting LBA.
		lba: i32,
	},

	/// # New Pregap Candidate.
	Candidate {
		/// # Track Number.
		track: u8,

		/// # LBA.
		lba: i32,

		/// # Pregap (Sectors).
		pregap: u32,
	},

	/// # Inexact Positioning.
	///
	/// The drive returned Q for a different sector than the one asked for.
	Inexact {
		/// # Requested LBA.
		lba: i32,

		/// # Reported LBA.
		actual: i32,
	},

	/// # Search Ceiling Reached.
	Ceiling {
		/// # Track Number.
		track: u8,

		/// # Steps Taken.
		steps: u32,
	},

	/// # Final Pregap.
	Pregap {
		/// # Track Number.
		track: u8,

		/// # Pregap (Sectors).
		pregap: u32,
	},

	/// # First Track Pregap: Start.
	FirstPregapStart,

	/// # First Track Pregap: Progress.
	FirstPregapProgress {
		/// # LBA.
		lba: i32,

		/// # Speed (MiB/s).
		speed: f64,
	},

	/// # First Track Pregap: Done.
	FirstPregapDone(u32),

	/// # User Abort.
	Aborted,
}

impl fmt::Display for DumpEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Self::Subchannel(s) => match (s.raw, s.q16) {
				(true, true) => f.write_str("Drive supports raw and Q16 subchannel."),
				(true, false) => f.write_str("Drive supports raw subchannel."),
				(false, true) => f.write_str("Drive supports Q16 subchannel."),
				(false, false) => f.write_str("Drive does not support subchannel; pregaps will not be calculated."),
			},
			Self::Encoding(e) => write!(f, "Drive returns {e} subchannel positions."),
			Self::EncodingUnknown => f.write_str("Could not detect if drive subchannel is BCD or not; pregaps could not be calculated, dump may be incorrect."),
			Self::Unreadable(lba) => write!(f, "Could not get correct subchannel for sector {lba}."),
			Self::ZeroPregap(track) => write!(f, "Track {track:02} has no pregap."),
			Self::Search { track, lba } => write!(f, "Searching for track {track:02} pregap from sector {lba}."),
			Self::Candidate { track, lba, pregap } => write!(f, "Track {track:02} pregap is at least {pregap} sectors (sector {lba})."),
			Self::Inexact { lba, actual } => write!(f, "Asked for sector {lba}, got sector {actual}."),
			Self::Ceiling { track, steps } => write!(f, "Track {track:02} pregap search did not converge after {steps} steps."),
			Self::Pregap { track, pregap } => write!(f, "Track {track:02} pregap is {pregap} sectors."),
			Self::FirstPregapStart => f.write_str("Reading first track pregap."),
			Self::FirstPregapProgress { lba, speed } => write!(f, "Trying to read first track pregap sector {lba} ({speed:.3} MiB/sec.)"),
			Self::FirstPregapDone(n) => write!(f, "Got {n} first track pregap sectors."),
			Self::Aborted => f.write_str("Aborted!"),
		}
	}
}

impl DumpEvent {
	#[must_use]
	/// # Severity.
	pub const fn severity(&self) -> Severity {
		match self {
			Self::Subchannel(s) if ! s.raw && ! s.q16 => Severity::Warning,
			Self::EncodingUnknown |
			Self::Unreadable(_) |
			Self::Ceiling { .. } |
			Self::Aborted => Severity::Warning,
			_ => Severity::Info,
		}
	}

	#[must_use]
	/// # Is Progress?
	///
	/// Progress pulses are chatty and ephemeral; logs can skip them.
	pub const fn is_progress(&self) -> bool {
		matches!(self, Self::FirstPregapProgress { .. })
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Severity.
pub enum Severity {
	/// # Informational.
	Info,

	/// # Warning.
	Warning,
}

impl Severity {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Info => "INFO",
			Self::Warning => "WARNING",
		}
	}
}



/// # Dump Observer.
///
/// Receive events as they happen.
pub trait DumpObserver {
	/// # Notify.
	fn notify(&mut self, event: DumpEvent);
}

impl DumpObserver for () {
	#[inline]
	fn notify(&mut self, _event: DumpEvent) {}
}

impl DumpObserver for Vec<DumpEvent> {
	#[inline]
	fn notify(&mut self, event: DumpEvent) { self.push(event); }
}
