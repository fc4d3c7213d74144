/*!
# Gap Find: Scripted Drive (Tests)
*/

use crate::{
	CD_DATA_SIZE,
	GapError,
	ReadCd,
	SectorType,
	SubchannelSelection,
	SubQ,
	SUBCHANNEL_RAW_SIZE,
	Transport,
};
use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			Ordering::Release,
		},
	},
	time::Duration,
};



/// # Q Script.
///
/// Called with the LBA and the number of previous subchannel reads at that
/// same LBA. `None` simulates a sense error.
type QScript = Box<dyn FnMut(i32, u32) -> Option<SubQ>>;

/// # Sector Script.
///
/// Called with the LBA for plain sector reads. `None` simulates a sense
/// error.
type SectorScript = Box<dyn FnMut(i32) -> Option<u8>>;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Read Kind.
pub(crate) enum MockRead {
	/// # Full Sector + Subchannel, All Types.
	Full,

	/// # Audio Sector + Subchannel.
	Audio,

	/// # Subchannel Only, All Types.
	SubAll,

	/// # Subchannel Only, CDDA.
	SubCdda,

	/// # Plextor Vendor Read.
	Plextor,

	/// # Plain Sector.
	Sector,
}

impl MockRead {
	/// # From Request.
	const fn from_req(req: &ReadCd) -> Self {
		if matches!(req.subchannel, SubchannelSelection::None) { Self::Sector }
		else if req.user_data {
			if matches!(req.sector_type, SectorType::AllTypes) { Self::Full }
			else { Self::Audio }
		}
		else if matches!(req.sector_type, SectorType::AllTypes) { Self::SubAll }
		else { Self::SubCdda }
	}
}



/// # Scripted Drive.
pub(crate) struct MockDrive {
	/// # Q Responses.
	q: QScript,

	/// # Sector Responses.
	sector: SectorScript,

	/// # Per-LBA Subchannel Read Counts.
	counts: HashMap<i32, u32>,

	/// # Accepted Read Kinds.
	accept: Vec<MockRead>,

	/// # Manufacturer.
	manufacturer: Option<String>,

	/// # Kill After N Good Sectors.
	kill: Option<(&'static Arc<AtomicBool>, u32)>,

	/// # Good Sector Reads.
	good_sectors: u32,

	/// # Read Log.
	pub(crate) reads: Vec<(i32, MockRead)>,
}

impl MockDrive {
	/// # New.
	///
	/// By default every READ CD variant works, but the Plextor command does
	/// not.
	pub(crate) fn new<F>(q: F) -> Self
	where F: FnMut(i32, u32) -> Option<SubQ> + 'static {
		Self {
			q: Box::new(q),
			sector: Box::new(|_| None),
			counts: HashMap::new(),
			accept: vec![
				MockRead::Full,
				MockRead::Audio,
				MockRead::SubAll,
				MockRead::SubCdda,
				MockRead::Sector,
			],
			manufacturer: None,
			kill: None,
			good_sectors: 0,
			reads: Vec::new(),
		}
	}

	/// # With Accepted Reads.
	pub(crate) fn with_accept<I>(mut self, iter: I) -> Self
	where I: IntoIterator<Item=MockRead> {
		self.accept = iter.into_iter().collect();
		self
	}

	/// # With Manufacturer.
	pub(crate) fn with_manufacturer(mut self, manufacturer: &str) -> Self {
		self.manufacturer = Some(manufacturer.to_owned());
		self
	}

	/// # With Sector Script.
	pub(crate) fn with_sectors<F>(mut self, sector: F) -> Self
	where F: FnMut(i32) -> Option<u8> + 'static {
		self.sector = Box::new(sector);
		self
	}

	/// # Kill After N Good Sectors.
	pub(crate) fn with_kill(mut self, flag: &'static Arc<AtomicBool>, after: u32) -> Self {
		self.kill = Some((flag, after));
		self
	}

	/// # Reads at LBA.
	pub(crate) fn reads_at(&self, lba: i32) -> usize {
		self.reads.iter().filter(|(l, _)| *l == lba).count()
	}

	/// # Scripted Q.
	fn script_q(&mut self, lba: i32) -> Option<SubQ> {
		let count = self.counts.entry(lba).or_insert(0);
		let nth = *count;
		*count += 1;
		(self.q)(lba, nth)
	}
}

impl Transport for MockDrive {
	fn read_cd(&mut self, req: &ReadCd) -> Result<Vec<u8>, GapError> {
		let kind = MockRead::from_req(req);
		self.reads.push((req.lba, kind));
		if ! self.accept.contains(&kind) { return Err(GapError::CdRead(req.lba)); }

		// Plain sector.
		if matches!(kind, MockRead::Sector) {
			let fill = (self.sector)(req.lba).ok_or(GapError::CdRead(req.lba))?;
			self.good_sectors += 1;
			if let Some((flag, after)) = self.kill {
				if self.good_sectors >= after { flag.store(true, Release); }
			}
			return Ok(vec![fill; usize::from(req.block_size)]);
		}

		let q = self.script_q(req.lba).ok_or(GapError::CdRead(req.lba))?;
		let mut out = Vec::with_capacity(usize::from(req.block_size));
		if req.user_data { out.resize(usize::from(CD_DATA_SIZE), 0); }
		match req.subchannel {
			SubchannelSelection::Raw => out.extend_from_slice(&interleave(&q)),
			SubchannelSelection::Q16 => {
				out.extend_from_slice(q.as_bytes());
				out.extend_from_slice(&[0, 0, 0, 0]);
			},
			SubchannelSelection::None => {},
		}

		Ok(out)
	}

	fn read_plextor_cdda(&mut self, lba: i32, block_size: u16)
	-> Result<Vec<u8>, GapError> {
		self.reads.push((lba, MockRead::Plextor));
		if ! self.accept.contains(&MockRead::Plextor) {
			return Err(GapError::CdRead(lba));
		}

		let q = self.script_q(lba).ok_or(GapError::CdRead(lba))?;
		let mut out = interleave(&q).to_vec();
		out.resize(usize::from(block_size), 0);
		Ok(out)
	}

	fn manufacturer(&self) -> Option<&str> { self.manufacturer.as_deref() }

	fn timeout(&self) -> Duration { Duration::from_secs(1) }
}



/// # Interleave Q.
///
/// Spread the Q bytes across bit six of a raw P-W block, the way a drive
/// would return them, with the other channels set for noise.
pub(crate) fn interleave(q: &SubQ) -> [u8; SUBCHANNEL_RAW_SIZE as usize] {
	let mut out = [0b1011_1111_u8; SUBCHANNEL_RAW_SIZE as usize];
	for (k, byte) in q.as_bytes().iter().enumerate() {
		for j in 0..8 {
			if 0 == (byte >> (7 - j)) & 1 { out[k * 8 + j] &= ! 0b0100_0000; }
			else { out[k * 8 + j] |= 0b0100_0000; }
		}
	}
	out
}

/// # Kill Flag.
///
/// Leak a fresh flag so it can back a `KillSwitch`.
pub(crate) fn kill_flag() -> &'static Arc<AtomicBool> {
	Box::leak(Box::new(Arc::new(AtomicBool::new(false))))
}
