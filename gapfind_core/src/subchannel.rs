/*!
# Gap Find: Q Subchannel
*/

use crate::{
	CD_LEADIN,
	GapError,
	SUBCHANNEL_Q_SIZE,
	SubQEncoding,
};
use crc::{
	Crc,
	CRC_16_GSM,
};
use std::fmt;



/// # Q CRC.
///
/// The Q subchannel is protected by an inverted CRC-16/CCITT (x^16 + x^12 +
/// x^5 + 1), stored big-endian in the last two bytes.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_GSM);

/// # Frames Per Second.
const FRAMES_PER_SECOND: i32 = 75;

/// # Q Mode: Position.
const Q_MODE_POSITION: u8 = 1;



/// # Deinterleave Q.
///
/// Raw subchannel data packs all eight channels (P through W) together, one
/// bit of each per byte. Q lives at bit six, so each group of eight raw bytes
/// collapses into a single Q byte, most significant bit first.
///
/// Returns `None` if the input length is not a multiple of eight.
pub fn deinterleave(raw: &[u8]) -> Option<Vec<u8>> {
	if raw.len() % 8 != 0 { return None; }

	Some(
		raw.chunks_exact(8)
			.map(|chunk| chunk.iter().fold(0_u8, |acc, &b| (acc << 1) | ((b >> 6) & 1)))
			.collect()
	)
}

/// # Binary to BCD.
///
/// Convert the position fields (indexes `1..=9`) from pure binary to
/// binary-coded-decimal in place. The mode byte and CRC are left alone.
pub fn to_bcd(q: &mut [u8; SUBCHANNEL_Q_SIZE]) {
	for v in &mut q[1..10] {
		*v = ((*v / 10) << 4) | (*v % 10);
	}
}

/// # BCD to Binary.
///
/// The inverse of [`to_bcd`].
pub fn to_binary(q: &mut [u8; SUBCHANNEL_Q_SIZE]) {
	for v in &mut q[1..10] {
		*v = (*v >> 4) * 10 + (*v & 0x0F);
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Native Q Subchannel.
///
/// These are the twelve Q bytes exactly as the drive produced them, in
/// whatever encoding it prefers. Nothing about them can be trusted until
/// they've passed through [`SubQ::validate`], which checks the CRC against
/// the drive-native byte stream before normalizing anything.
pub struct SubQ([u8; SUBCHANNEL_Q_SIZE]);

impl From<[u8; SUBCHANNEL_Q_SIZE]> for SubQ {
	#[inline]
	fn from(src: [u8; SUBCHANNEL_Q_SIZE]) -> Self { Self(src) }
}

impl TryFrom<&[u8]> for SubQ {
	type Error = GapError;

	/// # From Slice.
	///
	/// Only the first twelve bytes are kept; Q16 replies carry four extra
	/// bytes of padding.
	fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
		src.get(..SUBCHANNEL_Q_SIZE)
			.and_then(|v| <[u8; SUBCHANNEL_Q_SIZE]>::try_from(v).ok())
			.map(Self)
			.ok_or(GapError::CdReadBuffer)
	}
}

impl SubQ {
	#[must_use]
	/// # Raw Bytes.
	pub const fn as_bytes(&self) -> &[u8; SUBCHANNEL_Q_SIZE] { &self.0 }

	/// # Validate.
	///
	/// Check the CRC and decode the record.
	///
	/// The CRC is always computed over the BCD form, so binary-native drives
	/// have their bytes re-encoded first.
	///
	/// ## Errors
	///
	/// Returns an error if the encoding is unknown or the CRC does not match.
	pub fn validate(&self, encoding: SubQEncoding, lba: i32) -> Result<QChannel, GapError> {
		let mut q = self.0;
		match encoding {
			SubQEncoding::Bcd => {},
			SubQEncoding::Binary => { to_bcd(&mut q); },
			SubQEncoding::Unknown => return Err(GapError::Bug("Q encoding has not been probed")),
		}

		if CRC16.checksum(&q[..10]) == u16::from_be_bytes([q[10], q[11]]) {
			to_binary(&mut q);
			Ok(QChannel::from_binary(q))
		}
		else { Err(GapError::SubchannelCrc(lba)) }
	}

	#[must_use]
	/// # Decode Without Validation.
	///
	/// Normalize and decode the record, CRC be damned. This is only meant for
	/// positions that could not be read cleanly after every retry.
	///
	/// Binary-native bytes are pushed through BCD and back, same as they
	/// would be for validation, so garbage above 99 folds back into range.
	pub fn decode_unchecked(&self, encoding: SubQEncoding) -> QChannel {
		let mut q = self.0;
		if matches!(encoding, SubQEncoding::Binary) { to_bcd(&mut q); }
		to_binary(&mut q);
		QChannel::from_binary(q)
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Decoded Q Channel.
///
/// A Q record with its position fields normalized to pure binary.
pub struct QChannel {
	/// # Mode (ADR).
	mode: u8,

	/// # Track Number.
	track: u8,

	/// # Index Number.
	index: u8,

	/// # Relative Time (Within Track).
	relative: Msf,

	/// # Absolute Time (Disc).
	absolute: Msf,
}

impl QChannel {
	/// # From Binary.
	const fn from_binary(q: [u8; SUBCHANNEL_Q_SIZE]) -> Self {
		Self {
			mode: q[0] & 0x0F,
			track: q[1],
			index: q[2],
			relative: Msf::new(q[3], q[4], q[5]),
			absolute: Msf::new(q[7], q[8], q[9]),
		}
	}

	#[must_use]
	/// # Mode.
	///
	/// The low nibble of the first byte.
	pub const fn mode(&self) -> u8 { self.mode }

	#[must_use]
	/// # Is Position Data?
	///
	/// Only mode-1 records carry track/index/time information.
	pub const fn is_position(&self) -> bool { self.mode == Q_MODE_POSITION }

	#[must_use]
	/// # Track Number.
	pub const fn track(&self) -> u8 { self.track }

	#[must_use]
	/// # Index Number.
	///
	/// Zero marks a pregap.
	pub const fn index(&self) -> u8 { self.index }

	#[must_use]
	/// # Relative Time.
	pub const fn relative(&self) -> Msf { self.relative }

	#[must_use]
	/// # Absolute Time.
	pub const fn absolute(&self) -> Msf { self.absolute }

	#[must_use]
	/// # Absolute LBA.
	///
	/// The absolute time in sectors, less the lead-in.
	pub const fn absolute_lba(&self) -> i32 {
		self.absolute.sectors() - CD_LEADIN as i32
	}
}



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Minute/Second/Frame.
pub struct Msf {
	/// # Minutes.
	m: u8,

	/// # Seconds.
	s: u8,

	/// # Frames.
	f: u8,
}

impl fmt::Display for Msf {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:02}:{:02}:{:02}", self.m, self.s, self.f)
	}
}

impl Msf {
	#[must_use]
	/// # New.
	pub const fn new(m: u8, s: u8, f: u8) -> Self { Self { m, s, f } }

	#[must_use]
	/// # Total Sectors.
	pub const fn sectors(self) -> i32 {
		(self.m as i32 * 60 + self.s as i32) * FRAMES_PER_SECOND + self.f as i32
	}
}



#[cfg(test)]
/// # Build a Q Record.
///
/// Encode the fields (given in binary) as a drive would, complete with a
/// valid CRC.
pub(crate) fn build_q(
	encoding: SubQEncoding,
	track: u8,
	index: u8,
	relative: i32,
	lba: i32,
) -> SubQ {
	/// # Sectors to MSF Bytes.
	fn msf(sectors: i32) -> [u8; 3] {
		let sectors = u32::try_from(sectors).expect("Negative MSF.");
		[
			u8::try_from(sectors / 4500).expect("MSF overflow."),
			u8::try_from(sectors / 75 % 60).expect("MSF overflow."),
			u8::try_from(sectors % 75).expect("MSF overflow."),
		]
	}

	let rel = msf(relative);
	let abs = msf(lba + CD_LEADIN as i32);
	let mut q = [
		0x01, track, index,
		rel[0], rel[1], rel[2],
		0,
		abs[0], abs[1], abs[2],
		0, 0,
	];

	// The CRC is always over BCD.
	to_bcd(&mut q);
	let crc = CRC16.checksum(&q[..10]).to_be_bytes();
	q[10] = crc[0];
	q[11] = crc[1];

	if matches!(encoding, SubQEncoding::Binary) { to_binary(&mut q); }
	SubQ(q)
}

#[cfg(test)]
/// # Build a Non-Position Q Record.
///
/// Same as [`build_q`], but with mode two (catalog) in place of position
/// data. The CRC is still valid.
pub(crate) fn build_q_catalog(encoding: SubQEncoding, lba: i32) -> SubQ {
	let mut q = build_q(SubQEncoding::Bcd, 1, 1, 0, lba).0;
	q[0] = 0x02;
	let crc = CRC16.checksum(&q[..10]).to_be_bytes();
	q[10] = crc[0];
	q[11] = crc[1];

	if matches!(encoding, SubQEncoding::Binary) { to_binary(&mut q); }
	SubQ(q)
}
