/*!
# Gap Find: CLI
*/

use argyle::Argument;
use dactyl::traits::BytesToUnsigned;
use gapfind_core::{
	Disc,
	DriveVendorModel,
	DumpOptions,
	GapError,
};



/// # Options Return Type.
pub(super) type Parsed = (
	DumpOptions,
	Disc,
	Option<DriveVendorModel>,
	bool,
);



/// # Parse Options.
pub(super) fn parse() -> Result<Parsed, GapError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut opts = DumpOptions::default();
	let mut no_summary = false;
	let mut dev = None;
	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(GapError::PrintHelp),
			Argument::Key("--no-first-pregap") => { opts = opts.with_first_pregap(false); },
			Argument::Key("--no-q16") => { opts = opts.with_q16_subchannel(Some(false)); },
			Argument::Key("--no-raw") => { opts = opts.with_raw_subchannel(Some(false)); },
			Argument::Key("--no-save") => { opts = opts.with_save(false); },
			Argument::Key("--no-summary") => { no_summary = true; },
			Argument::Key("--plextor") => { opts = opts.with_plextor(true); },
			Argument::Key("-v" | "--verbose") => { opts = opts.with_verbose(true); },
			Argument::Key("-V" | "--version") => return Err(GapError::PrintVersion),

			Argument::KeyWithValue("-d" | "--dev", s) => { dev.replace(s); },
			Argument::KeyWithValue("--max-steps", s) => {
				let s = u32::btou(s.trim().as_bytes())
					.ok_or(GapError::CliParse("--max-steps"))?;
				opts = opts.with_max_steps(s);
			},
			Argument::KeyWithValue("--resume", s) => {
				let s = u32::btou(s.trim().as_bytes())
					.ok_or(GapError::CliParse("--resume"))?;
				opts = opts.with_resume(s);
			},

			_ => {},
		}
	}

	// Figure out the disc and drive.
	let disc = Disc::new(dev)?;
	let drivevendormodel = disc.drive_vendor_model();

	// Plextors get the vendor read fallback regardless.
	if drivevendormodel.is_some_and(|vm| vm.is_plextor()) {
		opts = opts.with_plextor(true);
	}

	Ok((opts, disc, drivevendormodel, no_summary))
}
