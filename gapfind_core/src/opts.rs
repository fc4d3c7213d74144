/*!
# Gap Find: Dump Options
*/

use crate::CD_LEADIN;



/// # FLAG: Plextor Vendor Reads.
const FLAG_PLEXTOR: u8 =     0b0000_0001;

/// # FLAG: Capture First Track Pregap.
const FLAG_FIRST_PREGAP: u8 = 0b0000_0010;

/// # FLAG: Save Artifacts.
const FLAG_SAVE: u8 =         0b0000_0100;

/// # FLAG: Verbose.
const FLAG_VERBOSE: u8 =      0b0000_1000;

/// # FLAG: Default.
const FLAG_DEFAULT: u8 = FLAG_FIRST_PREGAP | FLAG_SAVE;

/// # Default Search Ceiling.
///
/// Ten minutes' worth of sectors.
const MAX_STEPS_DEFAULT: u32 = 45_000;

/// # Minimum Search Ceiling.
const MAX_STEPS_MIN: u32 = CD_LEADIN as u32;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Dump Options.
///
/// Options are set using builder-style methods, like:
///
/// ```
/// use gapfind_core::DumpOptions;
///
/// let opts = DumpOptions::default()
///     .with_plextor(true)
///     .with_max_steps(10); // Too low; it'll be bumped.
///
/// assert!(opts.plextor());
/// assert!(opts.first_pregap());
/// assert_eq!(opts.max_steps(), 150);
/// ```
pub struct DumpOptions {
	raw: Option<bool>,
	q16: Option<bool>,
	resume: u32,
	max_steps: u32,
	flags: u8,
}

impl Default for DumpOptions {
	fn default() -> Self {
		Self {
			raw: None,
			q16: None,
			resume: 0,
			max_steps: MAX_STEPS_DEFAULT,
			flags: FLAG_DEFAULT,
		}
	}
}

macro_rules! with_flag {
	($fn:ident, $flag:ident, $($doc:literal),+ $(,)?) => (
		#[must_use]
		$(
			#[doc = $doc]
		)+
		pub const fn $fn(self, v: bool) -> Self {
			let flags =
				if v { self.flags | $flag }
				else { self.flags & ! $flag };

			Self {
				flags,
				..self
			}
		}
	)
}

/// ## Setters.
impl DumpOptions {
	with_flag!(
		with_first_pregap,
		FLAG_FIRST_PREGAP,
		"# Capture First Track Pregap.",
		"",
		"When `true`, try to read the 150 sectors preceding the first track",
		"when starting a dump from scratch.",
		"",
		"The default is `true`.",
	);

	#[must_use]
	/// # Search Ceiling.
	///
	/// Cap the number of positions the pregap search will visit for any one
	/// track. Drives that report garbage can otherwise send it bouncing back
	/// and forth forever.
	///
	/// The default is `45_000`. Values are raised to at least `150`.
	pub const fn with_max_steps(self, mut max_steps: u32) -> Self {
		if max_steps < MAX_STEPS_MIN { max_steps = MAX_STEPS_MIN; }
		Self {
			max_steps,
			..self
		}
	}

	with_flag!(
		with_plextor,
		FLAG_PLEXTOR,
		"# Plextor Vendor Reads.",
		"",
		"When `true`, fall back to the Plextor READ CD-DA command if none of",
		"the standard READ CD variants return raw subchannel. Drives that",
		"identify as Plextor get this automatically.",
		"",
		"The default is `false`.",
	);

	#[must_use]
	/// # Raw Subchannel Support.
	///
	/// Force raw P-W subchannel support on or off. `None` means detect.
	pub const fn with_raw_subchannel(self, raw: Option<bool>) -> Self {
		Self {
			raw,
			..self
		}
	}

	#[must_use]
	/// # Q16 Subchannel Support.
	///
	/// Force formatted Q subchannel support on or off. `None` means detect.
	pub const fn with_q16_subchannel(self, q16: Option<bool>) -> Self {
		Self {
			q16,
			..self
		}
	}

	#[must_use]
	/// # Resume Checkpoint.
	///
	/// The next block a previous, interrupted dump would have read. Anything
	/// other than zero means the first track pregap has already had its
	/// chance.
	pub const fn with_resume(self, resume: u32) -> Self {
		Self {
			resume,
			..self
		}
	}

	with_flag!(
		with_save,
		FLAG_SAVE,
		"# Save Artifacts.",
		"",
		"When `true`, the first track pregap and resolved track table are",
		"written to the `_gapfind` cache directory.",
		"",
		"The default is `true`.",
	);

	with_flag!(
		with_verbose,
		FLAG_VERBOSE,
		"# Verbose.",
		"",
		"When `true`, the timestamped dump log is printed to STDOUT.",
		"",
		"The default is `false`.",
	);
}

macro_rules! get_flag {
	($fn:ident, $flag:ident, $title:literal) => (
		#[must_use]
		#[doc = concat!("# ", $title, "?")]
		pub const fn $fn(&self) -> bool { $flag == self.flags & $flag }
	);
}

/// # Getters.
impl DumpOptions {
	get_flag!(first_pregap, FLAG_FIRST_PREGAP, "Capture First Track Pregap");
	get_flag!(plextor, FLAG_PLEXTOR, "Plextor Vendor Reads");
	get_flag!(save, FLAG_SAVE, "Save Artifacts");
	get_flag!(verbose, FLAG_VERBOSE, "Verbose");

	#[must_use]
	/// # Search Ceiling.
	pub const fn max_steps(&self) -> u32 { self.max_steps }

	#[must_use]
	/// # Raw Subchannel Override.
	pub const fn raw_subchannel(&self) -> Option<bool> { self.raw }

	#[must_use]
	/// # Q16 Subchannel Override.
	pub const fn q16_subchannel(&self) -> Option<bool> { self.q16 }

	#[must_use]
	/// # Resume Checkpoint.
	pub const fn resume(&self) -> u32 { self.resume }
}
