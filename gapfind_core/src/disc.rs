/*!
# Gap Find: Disc
*/

use cdtoc::Toc;
use crate::{
	cache_write,
	CD_LEADIN,
	CD_LEADOUT_LABEL,
	DriveVendorModel,
	DumpEvent,
	DumpObserver,
	DumpOptions,
	GapError,
	KillSwitch,
	LibcdioInstance,
	MediaTag,
	PregapReport,
	read_first_track_pregap,
	solve_pregaps,
	SubchannelSupport,
	Track,
	Transport,
};
use fyi_msg::fyi_ansi::{
	csi,
	dim,
};
use std::{
	fmt,
	path::{
		Path,
		PathBuf,
	},
};



/// # Track Table File Name.
const TRACKS_FILE: &str = "tracks.bin";



#[derive(Debug)]
/// # Disc.
///
/// A loaded and parsed compact disc.
pub struct Disc {
	/// # CDIO Instance.
	cdio: LibcdioInstance,

	/// # Disc Table of Contents.
	toc: Toc,

	/// # Tracks.
	tracks: Vec<Track>,

	/// # Data Track Number (If Any).
	data: Option<u8>,
}

impl fmt::Display for Disc {
	/// # Summarize the Disc.
	///
	/// This prints the disc identifiers and the track table, including the
	/// pregaps once they've been worked out.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		/// # Divider.
		const DIVIDER: &str = dim!("----------------------------------------\n");

		// A few key/value pairs.
		let kv: [(&str, &str, String); 2] = [
			("CDTOC:", csi!(bold, 199), self.toc.to_string()),
			("CDDB:", csi!(bold, blue), self.toc.cddb_id().to_string()),
		];

		let col_max: usize = kv.iter().map(|(k, _, _)| k.len()).max().unwrap_or(0);
		for (k, color, v) in kv {
			writeln!(
				f,
				concat!("{color}{k:col_max$}", csi!(), " {v}"),
				color=color,
				k=k,
				col_max=col_max,
				v=v,
			)?;
		}

		// Start the table.
		f.write_str(dim!("\n##   START  PREGAP  INDEX 01\n"))?;
		f.write_str(DIVIDER)?;

		for t in &self.tracks {
			let num = t.sequence();
			if Some(num) == self.data {
				writeln!(
					f,
					dim!("{:02}  {:>6}  {:>6}    {:>6}  DATA TRACK"),
					num,
					t.start_sector(),
					t.pregap_sectors(),
					t.index_one(),
				)?;
			}
			else {
				writeln!(
					f,
					"{num:02}  {:>6}  {:>6}    {:>6}",
					t.start_sector(),
					t.pregap_sectors(),
					t.index_one(),
				)?;
			}
		}

		// The leadout.
		writeln!(
			f,
			concat!(csi!(dim), "{}  {:>6}                    LEAD-OUT"),
			CD_LEADOUT_LABEL,
			self.toc.leadout_normalized(),
		)?;

		// Close it off!
		f.write_str(DIVIDER)?;
		writeln!(f)
	}
}

impl Disc {
	/// # New.
	///
	/// Load and parse the basic disc structure!
	///
	/// ## Errors
	///
	/// This will return an error if there's a problem communicating with the
	/// drive, the disc is unsupported, etc.
	pub fn new<P>(dev: Option<P>) -> Result<Self, GapError>
	where P: AsRef<Path> {
		let cdio = LibcdioInstance::new(dev)?;

		// Parse the table of contents into the pieces needed for `Toc`.
		let mut audio = Vec::new();
		let mut data = None;
		let mut data_num = None;
		let mut tracks = Vec::new();

		// The inclusive range to search.
		let from = cdio.first_track_num()?;
		let to = cdio.num_tracks()?;
		if to < from { return Err(GapError::NumTracks); }

		// Grab the position and type for each track.
		for idx in from..=to {
			let start = cdio.track_lba_start(idx)?;
			if cdio.track_format(idx)? { audio.push(start); }
			else {
				if data.is_some() || (idx != 1 && idx != to) {
					return Err(GapError::TrackFormat(idx));
				}
				data.replace(start);
				data_num.replace(idx);
			}

			let normalized = start.checked_sub(u32::from(CD_LEADIN))
				.and_then(|n| i32::try_from(n).ok())
				.ok_or(GapError::TrackLba(idx))?;
			tracks.push(Track::new(idx, normalized));
		}

		// Grab the leadout, then build the ToC.
		let leadout = cdio.leadout_lba()?;
		let toc = Toc::from_parts(audio, data, leadout).map_err(|_| GapError::Toc)?;

		// Finally done!
		Ok(Self { cdio, toc, tracks, data: data_num })
	}
}

impl Disc {
	#[must_use]
	#[inline]
	/// # Drive Vendor and Model.
	pub const fn drive_vendor_model(&self) -> Option<DriveVendorModel> {
		self.cdio.drive_vendor_model()
	}

	#[must_use]
	/// # Table of Contents.
	pub const fn toc(&self) -> &Toc { &self.toc }

	#[must_use]
	/// # Tracks.
	///
	/// Note: track starts only include pregaps after a successful dump.
	pub fn tracks(&self) -> &[Track] { &self.tracks }
}

impl Disc {
	/// # Dump!
	///
	/// Work out what subchannel the drive supports, grab the first track
	/// pregap, and resolve the pregaps of every other track, updating the
	/// track table accordingly.
	///
	/// Unless disabled, the results are saved to the cache afterward.
	///
	/// ## Errors
	///
	/// Read problems are reported to the observer rather than bubbled up, so
	/// errors are limited to cache/write issues.
	pub fn dump(
		&mut self,
		opts: &DumpOptions,
		killed: &KillSwitch,
		observer: &mut dyn DumpObserver,
	) -> Result<DumpReport, GapError> {
		let mut report = dump(&mut self.cdio, &mut self.tracks, opts, killed, observer);

		if opts.save() {
			if let Some(tag) = report.first_pregap.as_ref() {
				let dst = cache_write(&self.toc, tag.kind().file_name(), tag.as_bytes())?;
				report.saved.push(dst);
			}

			if report.pregaps.resolved() {
				let raw = bincode::serialize(&(&self.tracks, &report.pregaps))
					.map_err(|_| GapError::Write)?;
				let dst = cache_write(&self.toc, TRACKS_FILE, &raw)?;
				report.saved.push(dst);
			}
		}

		Ok(report)
	}
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Dump Report.
pub struct DumpReport {
	/// # Subchannel Support.
	support: SubchannelSupport,

	/// # First Track Pregap.
	first_pregap: Option<MediaTag>,

	/// # Pregap Details.
	pregaps: PregapReport,

	/// # Saved Files.
	saved: Vec<PathBuf>,
}

impl DumpReport {
	#[must_use]
	/// # Subchannel Support.
	pub const fn subchannel(&self) -> SubchannelSupport { self.support }

	#[must_use]
	/// # First Track Pregap.
	pub const fn first_track_pregap(&self) -> Option<&MediaTag> { self.first_pregap.as_ref() }

	#[must_use]
	/// # Pregaps Resolved?
	pub const fn resolved(&self) -> bool { self.pregaps.resolved() }

	#[must_use]
	/// # Inexact Positioning?
	pub const fn inexact_positioning(&self) -> bool { self.pregaps.inexact_positioning() }

	#[must_use]
	/// # Unconverged Tracks.
	pub fn unconverged(&self) -> &[u8] { self.pregaps.unconverged() }

	#[must_use]
	/// # Saved Files.
	pub fn saved(&self) -> &[PathBuf] { &self.saved }
}



/// # Dump.
///
/// The drive-agnostic part of [`Disc::dump`].
fn dump<T, O>(
	dev: &mut T,
	tracks: &mut [Track],
	opts: &DumpOptions,
	killed: &KillSwitch,
	observer: &mut O,
) -> DumpReport
where T: Transport, O: DumpObserver + ?Sized {
	// Only probe the drive for the things we weren't told.
	let detected =
		if opts.raw_subchannel().is_none() || opts.q16_subchannel().is_none() {
			SubchannelSupport::detect(dev)
		}
		else { SubchannelSupport::default() };
	let support = SubchannelSupport {
		raw: opts.raw_subchannel().unwrap_or(detected.raw),
		q16: opts.q16_subchannel().unwrap_or(detected.q16),
	};
	observer.notify(DumpEvent::Subchannel(support));

	let first_pregap =
		if opts.first_pregap() {
			read_first_track_pregap(dev, opts.resume(), killed, observer)
		}
		else { None };

	let pregaps =
		if killed.killed() { PregapReport::default() }
		else { solve_pregaps(dev, support, tracks, opts, killed, observer) };

	DumpReport {
		support,
		first_pregap,
		pregaps,
		saved: Vec::new(),
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		build_q,
		mock::{
			kill_flag,
			MockDrive,
			MockRead,
		},
		SubQEncoding,
	};

	/// # Two-Track Drive.
	///
	/// Sectors before zero are readable; track two has a 150-sector pregap.
	fn drive() -> MockDrive {
		MockDrive::new(|lba, _| Some(
			if (850..1000).contains(&lba) { build_q(SubQEncoding::Bcd, 2, 0, 999 - lba, lba) }
			else if lba < 850 { build_q(SubQEncoding::Bcd, 1, 1, lba.max(0), lba.max(0)) }
			else { build_q(SubQEncoding::Bcd, 2, 1, lba - 1000, lba) }
		))
			.with_sectors(|_| Some(3))
	}

	#[test]
	fn t_dump() {
		let mut dev = drive();
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let mut events = Vec::new();
		let killed = KillSwitch::from(kill_flag());
		let report = dump(&mut dev, &mut tracks, &DumpOptions::default(), &killed, &mut events);

		assert_eq!(report.subchannel(), SubchannelSupport { raw: true, q16: true });
		assert_eq!(report.first_track_pregap().map(MediaTag::len), Some(150 * 2352));
		assert!(report.resolved());
		assert!(! report.inexact_positioning());
		assert!(report.saved().is_empty());
		assert_eq!(tracks[1].start_sector(), 850);
		assert_eq!(tracks[1].pregap_sectors(), 150);
		assert_eq!(
			events.first(),
			Some(&DumpEvent::Subchannel(SubchannelSupport { raw: true, q16: true })),
		);
	}

	#[test]
	fn t_dump_overrides() {
		// Forcing both off means no detection and no pregap search.
		let mut dev = drive();
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let opts = DumpOptions::default()
			.with_raw_subchannel(Some(false))
			.with_q16_subchannel(Some(false))
			.with_first_pregap(false);
		let killed = KillSwitch::from(kill_flag());
		let report = dump(&mut dev, &mut tracks, &opts, &killed, &mut ());

		assert!(! report.resolved());
		assert!(report.first_track_pregap().is_none());
		assert!(dev.reads.is_empty(), "Nothing should have been read.");
		assert_eq!(tracks, [Track::new(1, 0), Track::new(2, 1000)]);

		// Forcing raw off should push everything through Q16.
		let mut dev = drive();
		let opts = DumpOptions::default()
			.with_raw_subchannel(Some(false))
			.with_resume(500);
		let report = dump(&mut dev, &mut tracks, &opts, &killed, &mut ());
		assert_eq!(report.subchannel(), SubchannelSupport { raw: false, q16: true });
		assert!(report.first_track_pregap().is_none(), "Resumed dumps skip the first pregap.");
		assert!(report.resolved());
		assert_eq!(tracks[1].start_sector(), 850);
		assert!(! dev.reads.iter().any(|(_, k)| matches!(k, MockRead::Sector)));
	}
}
