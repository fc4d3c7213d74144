/*!
# Gap Find: Library

This crate works out the pregaps of compact disc tracks by reading the Q
subchannel around each track's listed start, and captures the otherwise
hidden 150 sectors preceding the first track.

The drive is reached through the [`Transport`] trait; [`Disc`] wraps a
`libcdio` connection implementing it, while [`solve_pregaps`] and
[`read_first_track_pregap`] work with anything that does.
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod abort;
mod cache;
mod cdio;
mod disc;
mod drive;
mod encoding;
mod error;
mod event;
mod fetch;
mod first;
mod log;
mod mmc;
#[cfg(test)] mod mock;
mod opts;
mod pregap;
mod subchannel;
mod track;

pub use abort::KillSwitch;
pub(crate) use cache::cache_write;
pub(crate) use cdio::LibcdioInstance;
pub use disc::{
	Disc,
	DumpReport,
};
pub use drive::DriveVendorModel;
pub use encoding::SubQEncoding;
pub use error::GapError;
pub use event::{
	DumpEvent,
	DumpObserver,
	Severity,
};
pub use fetch::{
	FetchMode,
	SubchannelFetcher,
	SubchannelSupport,
};
pub use first::{
	MediaTag,
	MediaTagKind,
	read_first_track_pregap,
};
pub use log::DumpLog;
pub use mmc::{
	HeaderCodes,
	ReadCd,
	SectorType,
	SubchannelSelection,
	Transport,
};
pub use opts::DumpOptions;
pub use pregap::{
	PregapReport,
	solve_pregaps,
};
pub use subchannel::{
	deinterleave,
	Msf,
	QChannel,
	SubQ,
	to_bcd,
	to_binary,
};
#[cfg(test)] pub(crate) use subchannel::{
	build_q,
	build_q_catalog,
};
pub use track::Track;



/// # Cache Base.
///
/// The cache root is thus `CWD/CACHE_BASE`.
pub const CACHE_BASE: &str = "_gapfind";

/// # Size of data block.
///
/// A full raw sector, sync and headers included.
pub const CD_DATA_SIZE: u16 = 2352;

/// # Number of lead-in sectors.
///
/// All discs have a 2-second region at the start before any data. Different
/// contexts include or exclude this amount, so it's good to keep it handy.
pub const CD_LEADIN: u16 = 150;

/// # Lead-out Label.
///
/// This is used solely for the table of contents printout; e.g. 01 02 03 AA.
pub const CD_LEADOUT_LABEL: &str = "AA";

/// # Read Retries.
///
/// Subchannel reads are retried this many times before giving up on a
/// sector.
pub(crate) const RETRIES: u8 = 10;

/// # Size of Raw Subchannel.
///
/// All eight P-W channels, interleaved.
pub const SUBCHANNEL_RAW_SIZE: u16 = 96;

/// # Size of Formatted Q Subchannel.
pub const SUBCHANNEL_Q16_SIZE: u16 = 16;

/// # Size of Q Subchannel (Sans Padding).
pub const SUBCHANNEL_Q_SIZE: usize = 12;
