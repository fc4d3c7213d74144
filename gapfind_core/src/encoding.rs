/*!
# Gap Find: Q Encoding
*/

use crate::{
	GapError,
	RETRIES,
	SubchannelFetcher,
	Transport,
};
use std::fmt;



/// # Probe LBA.
///
/// Sector 11 is 00:02:11 in absolute time, so its frame field reads 0x11 in
/// BCD but 0x0B in binary.
const PROBE_LBA: i32 = 11;

/// # Probe Bit.
///
/// Bit four of the absolute frame byte.
const PROBE_MASK: u8 = 0b0001_0000;



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Q Position Encoding.
///
/// Drives are supposed to return Q position fields in binary-coded-decimal,
/// but some convert them to plain binary first. This has to be known before
/// any CRC can be checked.
pub enum SubQEncoding {
	#[default]
	/// # Not Yet Known.
	Unknown,

	/// # Binary-Coded Decimal.
	Bcd,

	/// # Pure Binary.
	Binary,
}

impl fmt::Display for SubQEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl SubQEncoding {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unknown => "unknown",
			Self::Bcd => "BCD",
			Self::Binary => "binary",
		}
	}

	/// # Probe.
	///
	/// Read sector 11 and check its absolute frame field to see which
	/// encoding the drive uses, giving up after ten failed reads.
	///
	/// ## Errors
	///
	/// Returns an error if the sector could not be read.
	pub fn probe<T: Transport>(fetch: &mut SubchannelFetcher<'_, T>)
	-> Result<Self, GapError> {
		for _ in 0..RETRIES {
			if let Ok(q) = fetch.fetch(PROBE_LBA) {
				return Ok(
					if 0 == q.as_bytes()[9] & PROBE_MASK { Self::Binary }
					else { Self::Bcd }
				);
			}
		}

		Err(GapError::SubchannelEncoding)
	}
}
