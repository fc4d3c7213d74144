/*!
# Gap Find: Tracks
*/

use serde::{
	Deserialize,
	Serialize,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
/// # Track.
///
/// A track as listed in the table of contents, plus the pregap length once
/// it has been resolved.
///
/// The start sector is a normalized LBA (i.e. without the 150-sector
/// lead-in). Once a pregap is applied, it points to the start of the pregap
/// rather than index one.
pub struct Track {
	/// # Sequence (Track Number).
	sequence: u8,

	/// # Start Sector.
	start: i32,

	/// # Pregap (Sectors).
	pregap: u32,
}

impl Track {
	#[must_use]
	/// # New.
	pub const fn new(sequence: u8, start: i32) -> Self {
		Self {
			sequence,
			start,
			pregap: 0,
		}
	}

	#[must_use]
	/// # Sequence.
	pub const fn sequence(&self) -> u8 { self.sequence }

	#[must_use]
	/// # Start Sector.
	pub const fn start_sector(&self) -> i32 { self.start }

	#[must_use]
	/// # Pregap Sectors.
	pub const fn pregap_sectors(&self) -> u32 { self.pregap }

	#[must_use]
	/// # Index One.
	///
	/// The sector where the track proper begins, regardless of pregap.
	pub const fn index_one(&self) -> i32 {
		self.start.saturating_add_unsigned(self.pregap)
	}

	/// # Apply Pregap.
	///
	/// Record the pregap and move the start back to meet it.
	pub(crate) fn apply_pregap(&mut self, pregap: u32) {
		self.pregap = pregap;
		self.start = self.start.saturating_sub_unsigned(pregap);
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_apply_pregap() {
		let mut t = Track::new(2, 1000);
		assert_eq!(t.index_one(), 1000);
		t.apply_pregap(150);
		assert_eq!(t.sequence(), 2);
		assert_eq!(t.start_sector(), 850);
		assert_eq!(t.pregap_sectors(), 150);
		assert_eq!(t.index_one(), 1000, "Index one should not move.");
	}
}
