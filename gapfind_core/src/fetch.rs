/*!
# Gap Find: Subchannel Fetcher
*/

use crate::{
	CD_DATA_SIZE,
	deinterleave,
	GapError,
	ReadCd,
	SectorType,
	SubchannelSelection,
	SubQ,
	SUBCHANNEL_RAW_SIZE,
	Transport,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Subchannel Support.
///
/// Which flavors of subchannel the drive can return alongside (or instead of)
/// sector data.
pub struct SubchannelSupport {
	/// # Raw P-W.
	pub raw: bool,

	/// # Formatted Q.
	pub q16: bool,
}

impl SubchannelSupport {
	#[must_use]
	/// # Detect.
	///
	/// Try a raw and a Q16 read of the first sector to see which (if either)
	/// the drive is willing to do.
	pub fn detect<T: Transport>(dev: &mut T) -> Self {
		Self {
			raw: dev.read_cd(&ReadCd::full(0, SubchannelSelection::Raw)).is_ok(),
			q16: dev.read_cd(&ReadCd::full(0, SubchannelSelection::Q16)).is_ok(),
		}
	}

	#[must_use]
	/// # Fetch Mode.
	///
	/// Raw is preferred when available. If neither is supported, there is
	/// nothing to fetch.
	pub const fn mode(self) -> Option<FetchMode> {
		if self.raw { Some(FetchMode::Raw96) }
		else if self.q16 { Some(FetchMode::Q16) }
		else { None }
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Fetch Mode.
pub enum FetchMode {
	/// # Raw, Interleaved.
	Raw96,

	/// # Formatted Q.
	Q16,
}

impl FetchMode {
	/// # As Selection.
	const fn selection(self) -> SubchannelSelection {
		match self {
			Self::Raw96 => SubchannelSelection::Raw,
			Self::Q16 => SubchannelSelection::Q16,
		}
	}
}



/// # Subchannel Fetcher.
///
/// This pulls the Q subchannel for individual sectors, working through the
/// READ CD variants from most to least demanding until the drive cooperates.
pub struct SubchannelFetcher<'a, T: Transport> {
	/// # Device.
	dev: &'a mut T,

	/// # Mode.
	mode: FetchMode,

	/// # Plextor Fallback?
	plextor: bool,
}

impl<T: Transport> fmt::Debug for SubchannelFetcher<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubchannelFetcher")
			.field("mode", &self.mode)
			.field("plextor", &self.plextor)
			.finish_non_exhaustive()
	}
}

impl<'a, T: Transport> SubchannelFetcher<'a, T> {
	/// # New.
	///
	/// The Plextor fallback is enabled if `plextor` is set or the drive
	/// identifies itself as a Plextor. It only ever applies to raw mode.
	pub fn new(dev: &'a mut T, mode: FetchMode, plextor: bool) -> Self {
		let plextor = plextor || dev.manufacturer().is_some_and(|m| m.trim().eq_ignore_ascii_case("plextor"));
		Self { dev, mode, plextor }
	}

	#[must_use]
	/// # Mode.
	pub const fn mode(&self) -> FetchMode { self.mode }

	/// # Fetch.
	///
	/// Read the Q subchannel for `lba`.
	///
	/// ## Errors
	///
	/// Returns the last error encountered if every variant fails.
	pub fn fetch(&mut self, lba: i32) -> Result<SubQ, GapError> {
		let sub = self.mode.selection();
		let attempts = [
			ReadCd::full(lba, sub),
			ReadCd::audio(lba, sub),
			ReadCd::subchannel_only(lba, SectorType::AllTypes, sub),
			ReadCd::subchannel_only(lba, SectorType::Cdda, sub),
		];

		let mut err = GapError::CdRead(lba);
		for req in attempts {
			match self.dev.read_cd(&req).and_then(|buf| slice(self.mode, &buf, req.subchannel_offset())) {
				Ok(q) => return Ok(q),
				Err(e) => { err = e; },
			}
		}

		// The last resort.
		if self.plextor && matches!(self.mode, FetchMode::Raw96) {
			let block_size = CD_DATA_SIZE + SUBCHANNEL_RAW_SIZE;
			self.dev.read_plextor_cdda(lba, block_size)
				.and_then(|buf| slice(self.mode, &buf, 0))
		}
		else { Err(err) }
	}
}



/// # Slice.
///
/// Pull the subchannel out of the reply, deinterleaving it if raw.
fn slice(mode: FetchMode, buf: &[u8], offset: usize) -> Result<SubQ, GapError> {
	match mode {
		FetchMode::Raw96 => {
			let raw = buf.get(offset..offset + usize::from(SUBCHANNEL_RAW_SIZE))
				.ok_or(GapError::CdReadBuffer)?;
			let q = deinterleave(raw).ok_or(GapError::CdReadBuffer)?;
			SubQ::try_from(q.as_slice())
		},
		FetchMode::Q16 => buf.get(offset..)
			.ok_or(GapError::CdReadBuffer)
			.and_then(SubQ::try_from),
	}
}
