/*!
# Gap Find: Errors
*/

use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
   .-----.
  /  .-.  \    Gap Find v", env!("CARGO_PKG_VERSION"), r"
 |  ( o )  |   Subchannel-accurate pregap
  \  '-'  /    detection for compact discs.
   '-----'

USAGE:
    gapfind [OPTIONS]

DRIVE SETTINGS:
    -d, --dev <PATH>  The device path for the optical drive containing the CD
                      of interest, like /dev/cdrom. [default: auto]
        --no-raw      Do not use raw (96-byte) subchannel reads, even if the
                      drive seems to support them.
        --no-q16      Do not use Q16 subchannel reads, even if the drive
                      seems to support them.
        --plextor     Treat the drive as supporting the Plextor READ CD-DA
                      vendor command, even if it isn't a Plextor.

SEARCH SETTINGS:
        --max-steps <NUM>
                      The maximum number of sector positions to visit while
                      searching for any one track's pregap before giving up.
                      [default: 45,000; min: 150]
        --no-first-pregap
                      Skip the capture of the 150 sectors preceding the first
                      track.
        --resume <BLOCK>
                      The next block to process according to an earlier,
                      interrupted dump. Any non-zero value means the first
                      track pregap was already captured and will be skipped.
                      [default: 0]

MISCELLANEOUS:
    -h, --help        Print help information to STDOUT and exit.
    -v, --verbose     Print the timestamped dump log to STDOUT, so it can e.g.
                      be piped to a file for review, like:
                      gapfind -v > gaps.log
    -V, --version     Print version information to STDOUT and exit.
        --no-save     Do not write the results to ./_gapfind.
        --no-summary  Skip the drive and disc summary.

EARLY EXIT:
    Press CTRL+C to stop early. Tracks resolved so far keep their pregaps; the
    rest are left at zero.
");



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Errors.
pub enum GapError {
	/// # Bug!
	Bug(&'static str),

	/// # Cache directory.
	Cache,

	/// # CD read error.
	CdRead(i32),

	/// # Reply buffer too small or oddly sized.
	CdReadBuffer,

	/// # CD read operation terminal failure.
	CdReadUnsupported,

	/// # Invalid device.
	Device,

	/// # Unable to open device.
	DeviceOpen,

	/// # Unsupported Disc.
	DiscMode,

	/// # Invalid drive model.
	DriveModel,

	/// # Invalid drive vendor.
	DriveVendor,

	/// # Unable to get first track number.
	FirstTrackNum,

	/// # User Abort.
	Killed,

	/// # Unable to get leadout.
	Leadout,

	/// # Unable to obtain the number of tracks.
	NumTracks,

	/// # Subchannel CRC Mismatch.
	SubchannelCrc(i32),

	/// # Subchannel Encoding Undetectable.
	SubchannelEncoding,

	/// # Unable to build a table of contents.
	Toc,

	/// # Invalid/unsupported track format.
	TrackFormat(u8),

	/// # Invalid track LBA.
	TrackLba(u8),

	/// # Invalid track number.
	TrackNumber(u8),

	/// # Writing to disk.
	Write,

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for GapError {}

impl From<GapError> for Msg {
	#[inline]
	fn from(src: GapError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for GapError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::Cache => f.write_str("Unable to establish a cache directory."),
			Self::CdRead(lba) => write!(f, "Read error at sector {lba}."),
			Self::CdReadBuffer => f.write_str("The drive returned an unexpected amount of data."),
			Self::CdReadUnsupported => f.write_str("Unable to read CD; settings are probably wrong."),
			Self::Device => f.write_str("Invalid device path."),
			Self::DeviceOpen => f.write_str("Unable to open connection with the optical drive."),
			Self::DiscMode => f.write_str("Missing or unsupported disc type."),
			Self::DriveModel => f.write_str("Invalid drive model."),
			Self::DriveVendor => f.write_str("Invalid drive vendor."),
			Self::FirstTrackNum => f.write_str("Unable to obtain the first track index."),
			Self::Killed => f.write_str("User abort."),
			Self::Leadout => f.write_str("Unable to obtain leadout."),
			Self::NumTracks => f.write_str("Unable to obtain the track total."),
			Self::SubchannelCrc(lba) => write!(f, "Subchannel CRC mismatch at sector {lba}."),
			Self::SubchannelEncoding => f.write_str("Unable to tell whether the drive's subchannel data is BCD or binary."),
			Self::Toc => f.write_str("Unable to parse the table of contents."),
			Self::TrackFormat(n) => write!(f, "Unsupported track type ({n})."),
			Self::TrackLba(n) => write!(f, "Unable to obtain LBA ({n})."),
			Self::TrackNumber(n) => write!(f, "Invalid track number ({n})."),
			Self::Write => f.write_str("Unable to save the results."),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Gap Find v", env!("CARGO_PKG_VERSION"))),
		}
	}
}
