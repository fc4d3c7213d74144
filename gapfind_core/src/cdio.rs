/*!
# Gap Find: `libcdio` Wrappers
*/

use crate::{
	CD_LEADIN,
	DriveVendorModel,
	GapError,
	ReadCd,
	Transport,
};
use libcdio_sys::{
	cdio_hwinfo,
	cdio_track_enums_CDIO_CDROM_LEADOUT_TRACK,
	discmode_t_CDIO_DISC_MODE_CD_DA,
	discmode_t_CDIO_DISC_MODE_CD_DATA,
	discmode_t_CDIO_DISC_MODE_CD_MIXED,
	driver_id_t_DRIVER_DEVICE, // The equivalent of "use whatever's best".
	driver_return_code_t_DRIVER_OP_NOT_PERMITTED,
	driver_return_code_t_DRIVER_OP_SUCCESS,
	track_format_t_TRACK_FORMAT_AUDIO,
	track_format_t_TRACK_FORMAT_ERROR,
};
use std::{
	ffi::{
		CStr,
		CString,
	},
	os::unix::ffi::OsStrExt,
	path::Path,
	sync::Once,
	time::Duration,
};



static LIBCDIO_INIT: Once = Once::new();

/// # Default Command Timeout.
const TIMEOUT: Duration = Duration::from_secs(10);

/// # Plextor READ CD-DA Opcode.
const PLEXTOR_READ_CDDA: u8 = 0xD8;

/// # Plextor Subcode: Raw P-W.
const PLEXTOR_SUBCODE_RAW: u8 = 0x02;



#[derive(Debug)]
#[allow(dead_code)] // We just want to make sure dev lives as long as the ptr.
/// # CDIO Instance.
pub(super) struct LibcdioInstance {
	dev: Option<CString>,
	ptr: *mut libcdio_sys::CdIo_t,
	drive: Option<DriveVendorModel>,
}

impl Drop for LibcdioInstance {
	#[allow(unsafe_code)]
	fn drop(&mut self) {
		// Release the C memory!
		if ! self.ptr.is_null() {
			unsafe { libcdio_sys::cdio_destroy(self.as_mut_ptr()); }
		}
	}
}

impl LibcdioInstance {
	#[allow(unsafe_code)]
	/// # New!
	///
	/// Initialize a new instance, optionally connecting to a specific device.
	///
	/// ## Errors
	///
	/// This will return an error if initialization fails, or if the provided
	/// device path is obviously wrong.
	pub(super) fn new<P>(dev: Option<P>) -> Result<Self, GapError>
	where P: AsRef<Path> {
		// Make sure the library has been initialized.
		init();

		// Take a look at the desired device.
		let dev = {
			if let Some(dev) = dev {
				let dev = dev.as_ref();
				if ! dev.exists() { return Err(GapError::Device); }
				let dev = CString::new(dev.as_os_str().as_bytes())
					.map_err(|_| GapError::Device)?;
				Some(dev)
			}
			else { None }
		};

		// Connect to it.
		let ptr = unsafe {
			libcdio_sys::cdio_open(
				dev.as_ref().map_or_else(std::ptr::null, |v| v.as_ptr()),
				driver_id_t_DRIVER_DEVICE,
			)
		};

		// NULL is bad.
		if ptr.is_null() { Err(GapError::DeviceOpen) }
		// Otherwise maybe!
		else {
			let mut out = Self {
				dev,
				ptr,
				drive: None,
			};

			out._check_disc_mode()?;
			out.drive = out._drive_vendor_model();

			Ok(out)
		}
	}

	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // These aren't our globals.
	/// # Check Disc Mode.
	///
	/// This makes sure a CD is actually present in the drive.
	///
	/// ## Errors
	///
	/// Returns an error if the disc is missing or unsupported.
	fn _check_disc_mode(&self) -> Result<(), GapError> {
		let discmode = unsafe {
			libcdio_sys::cdio_get_discmode(self.as_mut_ptr())
		};
		if matches!(
			discmode,
			discmode_t_CDIO_DISC_MODE_CD_DA |
			discmode_t_CDIO_DISC_MODE_CD_DATA |
			discmode_t_CDIO_DISC_MODE_CD_MIXED
		) {
			Ok(())
		}
		else { Err(GapError::DiscMode) }
	}

	#[allow(unsafe_code, clippy::cast_sign_loss)]
	/// # Drive Vendor/Model.
	///
	/// Fetch the drive vendor and model, if possible.
	fn _drive_vendor_model(&self) -> Option<DriveVendorModel> {
		let mut raw = cdio_hwinfo {
			psz_vendor: [0; 9],
			psz_model: [0; 17],
			psz_revision: [0; 5],
		};

		// The return code is a bool, true for good, instead of the usual
		// 0 for good.
		if 1 == unsafe { libcdio_sys::cdio_get_hwinfo(self.as_ptr(), &mut raw) } {
			let vendor_u8 = raw.psz_vendor.map(|b| b as u8);
			let model_u8 = raw.psz_model.map(|b| b as u8);

			// Vendor might be empty.
			let vendor =
				if vendor_u8[0] == 0 { "" }
				else {
					CStr::from_bytes_until_nul(vendor_u8.as_slice())
					.ok()
					.and_then(|v| v.to_str().ok())?
				};

			// But model is required.
			let model =
				if model_u8[0] == 0 { None }
				else {
					CStr::from_bytes_until_nul(model_u8.as_slice())
					.ok()
					.and_then(|v| v.to_str().ok())
				}?;

			DriveVendorModel::new(vendor, model).ok()
		}
		else { None }
	}
}

impl LibcdioInstance {
	/// # As Ptr.
	pub(super) const fn as_ptr(&self) -> *const libcdio_sys::CdIo_t { self.ptr.cast() }

	/// # As Mut Ptr.
	pub(super) const fn as_mut_ptr(&self) -> *mut libcdio_sys::CdIo_t { self.ptr }

	/// # Drive Vendor/Model.
	pub(super) const fn drive_vendor_model(&self) -> Option<DriveVendorModel> { self.drive }
}

impl LibcdioInstance {
	#[allow(unsafe_code)]
	/// # First Track Number.
	pub(super) fn first_track_num(&self) -> Result<u8, GapError> {
		let raw = unsafe {
			libcdio_sys::cdio_get_first_track_num(self.as_ptr())
		};

		if raw == 0 { Err(GapError::FirstTrackNum) }
		else { Ok(raw) }
	}

	/// # Leadout.
	pub(super) fn leadout_lba(&self) -> Result<u32, GapError> {
		let idx = u8::try_from(cdio_track_enums_CDIO_CDROM_LEADOUT_TRACK)
			.unwrap_or(170);
		self.track_lba_start(idx).map_err(|_| GapError::Leadout)
	}

	#[allow(unsafe_code)]
	/// # Get the Number of Tracks.
	pub(super) fn num_tracks(&self) -> Result<u8, GapError> {
		let raw = unsafe {
			libcdio_sys::cdio_get_num_tracks(self.as_ptr())
		};

		if raw == 0 { Err(GapError::NumTracks) }
		else { Ok(raw) }
	}

	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // Not our globals.
	/// # Track Format.
	///
	/// Returns `true` for audio, `false` for data, and an error if libcdio
	/// can't tell.
	pub(super) fn track_format(&self, idx: u8) -> Result<bool, GapError> {
		let kind = unsafe {
			libcdio_sys::cdio_get_track_format(self.as_ptr(), idx)
		};

		match kind {
			track_format_t_TRACK_FORMAT_AUDIO => Ok(true),
			track_format_t_TRACK_FORMAT_ERROR => Err(GapError::TrackFormat(idx)),
			_ => Ok(false),
		}
	}

	#[allow(unsafe_code)]
	/// # Track LBA Start.
	///
	/// Note: this includes the 150-sector lead-in.
	pub(super) fn track_lba_start(&self, idx: u8) -> Result<u32, GapError> {
		if idx == 0 { Err(GapError::TrackNumber(0)) }
		else {
			let raw = unsafe {
				libcdio_sys::cdio_get_track_lsn(self.as_ptr(), idx)
			};
			if raw < 0 { Err(GapError::TrackLba(idx)) }
			else { Ok(raw.abs_diff(0) + u32::from(CD_LEADIN)) }
		}
	}
}

impl Transport for LibcdioInstance {
	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // Not our globals.
	/// # Read CD.
	///
	/// Issue a single-block MMC READ CD with the requested fields.
	fn read_cd(&mut self, req: &ReadCd) -> Result<Vec<u8>, GapError> {
		let mut buf = vec![0_u8; usize::from(req.block_size)];
		let res = unsafe {
			libcdio_sys::mmc_read_cd(
				self.as_ptr(),
				buf.as_mut_ptr().cast(),
				req.lba,
				(req.sector_type as u8).into(),
				0,      // No random data manipulation thank you kindly.
				req.sync.into(),
				(req.headers as u8).into(),
				req.user_data.into(),
				req.edc_ecc.into(),
				0,      // No C2.
				(req.subchannel as u8).into(),
				req.block_size,
				1,      // One block at a time.
			)
		};

		match res {
			driver_return_code_t_DRIVER_OP_NOT_PERMITTED => Err(GapError::CdReadUnsupported),
			driver_return_code_t_DRIVER_OP_SUCCESS => Ok(buf),
			_ => Err(GapError::CdRead(req.lba)),
		}
	}

	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // Not our globals.
	/// # Plextor READ CD-DA.
	///
	/// Issue the vendor-specific `0xD8` command for a single block, with the
	/// LBA and block count packed big-endian into the CDB.
	fn read_plextor_cdda(&mut self, lba: i32, block_size: u16)
	-> Result<Vec<u8>, GapError> {
		let mut buf = vec![0_u8; usize::from(block_size)];

		// The CDB is plain bytes, so zero is a fine starting point.
		let mut cdb: libcdio_sys::mmc_cdb_t = unsafe { std::mem::zeroed() };
		cdb.field[0] = PLEXTOR_READ_CDDA;
		cdb.field[2..6].copy_from_slice(&lba.to_be_bytes());
		cdb.field[6..10].copy_from_slice(&1_u32.to_be_bytes());
		cdb.field[10] = PLEXTOR_SUBCODE_RAW;

		let timeout = u32::try_from(self.timeout().as_millis()).unwrap_or(u32::MAX);
		let res = unsafe {
			libcdio_sys::mmc_run_cmd(
				self.as_ptr(),
				timeout,
				&cdb,
				0,      // Read.
				u32::from(block_size),
				buf.as_mut_ptr().cast(),
			)
		};

		match res {
			driver_return_code_t_DRIVER_OP_NOT_PERMITTED => Err(GapError::CdReadUnsupported),
			driver_return_code_t_DRIVER_OP_SUCCESS => Ok(buf),
			_ => Err(GapError::CdRead(lba)),
		}
	}

	fn manufacturer(&self) -> Option<&str> {
		self.drive.as_ref().map(DriveVendorModel::vendor)
	}

	fn timeout(&self) -> Duration { TIMEOUT }
}



#[allow(unsafe_code)]
/// # Initialize `libcdio`.
fn init() {
	LIBCDIO_INIT.call_once(|| unsafe { libcdio_sys::cdio_init(); });
}
