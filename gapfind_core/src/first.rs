/*!
# Gap Find: First Track Pregap
*/

use crate::{
	CD_DATA_SIZE,
	CD_LEADIN,
	DumpEvent,
	DumpObserver,
	KillSwitch,
	ReadCd,
	Transport,
};
use std::time::{
	Duration,
	Instant,
};



/// # Progress Interval.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// # Bytes Per MiB.
const MIB: f64 = 1_048_576.0;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Media Tag Kind.
pub enum MediaTagKind {
	/// # First Track Pregap.
	FirstTrackPregap,
}

impl MediaTagKind {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::FirstTrackPregap => "first track pregap",
		}
	}

	#[must_use]
	/// # File Name.
	///
	/// The name to use when saving the tag to the cache.
	pub const fn file_name(self) -> &'static str {
		match self {
			Self::FirstTrackPregap => "first-track-pregap.bin",
		}
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Media Tag.
///
/// A blob of disc-level data captured alongside the dump.
pub struct MediaTag {
	/// # Kind.
	kind: MediaTagKind,

	/// # Data.
	data: Vec<u8>,
}

impl MediaTag {
	#[must_use]
	/// # Kind.
	pub const fn kind(&self) -> MediaTagKind { self.kind }

	#[must_use]
	/// # As Bytes.
	pub fn as_bytes(&self) -> &[u8] { &self.data }
}



/// # Read First Track Pregap.
///
/// Try to read the 150 sectors preceding LBA zero. Drives often refuse some
/// or all of these; anything unreadable before the first success is simply
/// skipped, while anything after is zero-filled to keep the positions
/// aligned.
///
/// Nothing is read when resuming (`resume` is non-zero), as a previous run
/// will already have had its chance.
///
/// Returns `None` if no sector could be read.
pub fn read_first_track_pregap<T, O>(
	dev: &mut T,
	resume: u32,
	killed: &KillSwitch,
	observer: &mut O,
) -> Option<MediaTag>
where T: Transport, O: DumpObserver + ?Sized {
	if resume != 0 { return None; }

	observer.notify(DumpEvent::FirstPregapStart);

	let sector_size = usize::from(CD_DATA_SIZE);
	let mut data: Vec<u8> = Vec::with_capacity(sector_size * usize::from(CD_LEADIN));
	let mut good = 0_u32;
	let mut seen = false;

	let mut last = Instant::now();
	let mut sectors = 0_u32;
	for lba in -i32::from(CD_LEADIN)..0 {
		if killed.killed() {
			observer.notify(DumpEvent::Aborted);
			break;
		}

		let elapsed = last.elapsed();
		if PROGRESS_INTERVAL <= elapsed {
			let speed = f64::from(sectors) * f64::from(CD_DATA_SIZE) / (MIB * elapsed.as_secs_f64());
			observer.notify(DumpEvent::FirstPregapProgress { lba, speed });
			sectors = 0;
			last = Instant::now();
		}

		match dev.read_cd(&ReadCd::raw_sector(lba)) {
			Ok(buf) if buf.len() == sector_size => {
				data.extend_from_slice(&buf);
				good += 1;
				seen = true;
			},
			_ => if seen { data.resize(data.len() + sector_size, 0); },
		}

		sectors += 1;
	}

	observer.notify(DumpEvent::FirstPregapDone(good));

	if good == 0 { None }
	else {
		Some(MediaTag {
			kind: MediaTagKind::FirstTrackPregap,
			data,
		})
	}
}
