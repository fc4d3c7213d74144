/*!
# Gap Find: Drive Vendor/Model
*/

use crate::GapError;
use std::fmt;



/// # Vendor Length.
///
/// SCSI INQUIRY vendor fields are eight bytes.
const VENDOR_LEN: usize = 8;

/// # Model Length.
const MODEL_LEN: usize = 16;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Drive Vendor and Model.
///
/// The vendor and model strings reported by the drive, trimmed. The vendor
/// may be empty, but the model may not.
pub struct DriveVendorModel {
	/// # Vendor (Space-Padded).
	vendor: [u8; VENDOR_LEN],

	/// # Vendor Length.
	vendor_len: u8,

	/// # Model (Space-Padded).
	model: [u8; MODEL_LEN],

	/// # Model Length.
	model_len: u8,
}

impl fmt::Display for DriveVendorModel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let vendor = self.vendor();
		if vendor.is_empty() { f.write_str(self.model()) }
		else { write!(f, "{vendor} {}", self.model()) }
	}
}

impl DriveVendorModel {
	/// # New.
	///
	/// ## Errors
	///
	/// Returns an error if either value is too long or contains anything
	/// other than printable ASCII, or if the model is empty.
	pub fn new(vendor: &str, model: &str) -> Result<Self, GapError> {
		let (vendor, vendor_len) = pad::<VENDOR_LEN>(vendor.trim())
			.ok_or(GapError::DriveVendor)?;
		let (model, model_len) = pad::<MODEL_LEN>(model.trim())
			.filter(|(_, len)| 0 != *len)
			.ok_or(GapError::DriveModel)?;

		Ok(Self { vendor, vendor_len, model, model_len })
	}

	#[must_use]
	/// # Vendor.
	pub fn vendor(&self) -> &str {
		std::str::from_utf8(&self.vendor[..usize::from(self.vendor_len)]).unwrap_or_default()
	}

	#[must_use]
	/// # Model.
	pub fn model(&self) -> &str {
		std::str::from_utf8(&self.model[..usize::from(self.model_len)]).unwrap_or_default()
	}

	#[must_use]
	/// # Is Plextor?
	///
	/// Plextor drives can fall back to their own READ CD-DA command for
	/// subchannel reads.
	pub fn is_plextor(&self) -> bool {
		self.vendor().eq_ignore_ascii_case("plextor")
	}
}



/// # Pad.
///
/// Copy a printable ASCII string into a fixed array, returning it along with
/// its length.
fn pad<const N: usize>(src: &str) -> Option<([u8; N], u8)> {
	if N < src.len() || ! src.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
		return None;
	}

	let mut out = [b' '; N];
	out[..src.len()].copy_from_slice(src.as_bytes());
	let len = u8::try_from(src.len()).ok()?;
	Some((out, len))
}
