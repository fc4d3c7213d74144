/*!
# Gap Find: MMC Commands
*/

use crate::{
	CD_DATA_SIZE,
	GapError,
	SUBCHANNEL_Q16_SIZE,
	SUBCHANNEL_RAW_SIZE,
};
use std::time::Duration;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Expected Sector Type.
///
/// The values match the READ CD command's "expected sector type" field.
pub enum SectorType {
	/// # Anything Goes.
	AllTypes = 0,

	/// # Audio Only.
	Cdda = 1,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Header Codes.
pub enum HeaderCodes {
	/// # No Headers.
	None = 0,

	/// # Header and Subheader.
	AllHeaders = 3,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Subchannel Selection.
pub enum SubchannelSelection {
	/// # No Subchannel.
	None = 0,

	/// # Raw P-W (96 bytes, interleaved).
	Raw = 1,

	/// # Formatted Q (16 bytes).
	Q16 = 2,
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # READ CD Request.
///
/// This holds everything needed to issue a single-sector READ CD command.
/// The named constructors cover the handful of variants actually used.
pub struct ReadCd {
	/// # Logical Block Address.
	pub lba: i32,

	/// # Block Size.
	pub block_size: u16,

	/// # Expected Sector Type.
	pub sector_type: SectorType,

	/// # Sync Bytes.
	pub sync: bool,

	/// # Header Codes.
	pub headers: HeaderCodes,

	/// # User Data.
	pub user_data: bool,

	/// # EDC/ECC.
	pub edc_ecc: bool,

	/// # Subchannel.
	pub subchannel: SubchannelSelection,
}

impl ReadCd {
	#[must_use]
	/// # Full Sector + Subchannel.
	///
	/// Request the whole 2352-byte sector followed by the subchannel, with
	/// every field turned on.
	pub const fn full(lba: i32, subchannel: SubchannelSelection) -> Self {
		Self {
			lba,
			block_size: CD_DATA_SIZE + subchannel_size(subchannel),
			sector_type: SectorType::AllTypes,
			sync: true,
			headers: HeaderCodes::AllHeaders,
			user_data: true,
			edc_ecc: true,
			subchannel,
		}
	}

	#[must_use]
	/// # Audio Sector + Subchannel.
	///
	/// Same as [`ReadCd::full`], but expressed the way a CD-DA sector has to
	/// be asked for: user data only.
	pub const fn audio(lba: i32, subchannel: SubchannelSelection) -> Self {
		Self {
			lba,
			block_size: CD_DATA_SIZE + subchannel_size(subchannel),
			sector_type: SectorType::Cdda,
			sync: false,
			headers: HeaderCodes::None,
			user_data: true,
			edc_ecc: false,
			subchannel,
		}
	}

	#[must_use]
	/// # Subchannel Only.
	///
	/// Ask for the subchannel and nothing else.
	pub const fn subchannel_only(lba: i32, sector_type: SectorType, subchannel: SubchannelSelection)
	-> Self {
		Self {
			lba,
			block_size: subchannel_size(subchannel),
			sector_type,
			sync: false,
			headers: HeaderCodes::None,
			user_data: false,
			edc_ecc: false,
			subchannel,
		}
	}

	#[must_use]
	/// # Raw Sector.
	///
	/// The whole 2352-byte sector with no subchannel or error field.
	pub const fn raw_sector(lba: i32) -> Self {
		Self::full(lba, SubchannelSelection::None)
	}

	#[must_use]
	/// # Subchannel Offset.
	///
	/// Return the position of the subchannel within the reply buffer.
	pub const fn subchannel_offset(&self) -> usize {
		if self.user_data { CD_DATA_SIZE as usize }
		else { 0 }
	}
}



/// # Subchannel Size.
const fn subchannel_size(subchannel: SubchannelSelection) -> u16 {
	match subchannel {
		SubchannelSelection::None => 0,
		SubchannelSelection::Raw => SUBCHANNEL_RAW_SIZE,
		SubchannelSelection::Q16 => SUBCHANNEL_Q16_SIZE,
	}
}



/// # Command Transport.
///
/// This is the boundary between the pregap logic and the drive. Every method
/// blocks until the drive answers (or the command times out), and the caller
/// is assumed to have exclusive use of the device for the duration.
pub trait Transport {
	/// # READ CD.
	///
	/// Read one sector according to the request, returning the reply buffer
	/// (exactly `block_size` bytes).
	///
	/// ## Errors
	///
	/// Any sense condition or transport failure is an error.
	fn read_cd(&mut self, req: &ReadCd) -> Result<Vec<u8>, GapError>;

	/// # Plextor READ CD-DA.
	///
	/// Issue the vendor-specific audio read for one sector, with raw P-W
	/// subchannel appended.
	///
	/// ## Errors
	///
	/// Any sense condition or transport failure is an error.
	fn read_plextor_cdda(&mut self, lba: i32, block_size: u16)
	-> Result<Vec<u8>, GapError>;

	/// # Manufacturer.
	fn manufacturer(&self) -> Option<&str>;

	/// # Command Timeout.
	fn timeout(&self) -> Duration;
}
