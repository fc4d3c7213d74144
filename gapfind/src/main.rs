/*!
# Gap Find
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![expect(clippy::redundant_pub_crate, reason = "Unresolvable.")]



mod cli;

use dactyl::NiceU32;
use fyi_msg::{
	fyi_ansi::{
		ansi,
		csi,
	},
	Msg,
	Progless,
};
use gapfind_core::{
	Disc,
	DumpEvent,
	DumpLog,
	DumpObserver,
	DumpOptions,
	DumpReport,
	GapError,
	KillSwitch,
	Severity,
};
use oxford_join::OxfordJoin;
use std::{
	process::ExitCode,
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			Ordering::Release,
		},
	},
};
use utc2k::FmtUtc2k;



/// # A Divider Line.
///
/// This is used to encase the drive vendor/model during summary. We'll slice
/// it to match the length rather than `"-".repeat()` or whatever.
const DIVIDER: &str = "--------------------------------";

/// # First Track Pregap Sectors.
const FIRST_PREGAP_SECTORS: u32 = 150;



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e @ (GapError::PrintHelp | GapError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).eprint();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn main__() -> Result<(), GapError> {
	let (opts, mut disc, drivevendormodel, no_summary) = cli::parse()?;

	// Quiet?
	if ! no_summary {
		if let Some(vm) = drivevendormodel {
			let vm = vm.to_string();
			if ! vm.is_empty() && vm.len() <= DIVIDER.len() {
				eprintln!(
					concat!(
						ansi!((dim, cyan) "{}\n"),
						ansi!((bold, cyan) "{vm}\n"),
						ansi!((dim, cyan) "{}\n"),
					),
					&DIVIDER[..vm.len()],
					&DIVIDER[..vm.len()],
					vm=vm
				);
			}
		}

		eprintln!("{disc}");
	}

	// Set up the killswitch.
	let killed = killswitch();

	// Log header.
	if opts.verbose() { log_header(&disc, &opts); }

	// Dump!
	let report = {
		let progress = Progless::default();
		let mut observer = TermObserver {
			progress: &progress,
			done: 0,
			log: opts.verbose().then(DumpLog::new),
		};
		disc.dump(&opts, &killed, &mut observer)?
	};

	summarize(&disc, &report, no_summary);

	if killed.killed() { Err(GapError::Killed) }
	else { Ok(()) }
}

/// # Kill Switch.
///
/// Leak a flag for CTRL+C to flip so the dump can wrap up early.
fn killswitch() -> KillSwitch {
	let flag: &'static Arc<AtomicBool> = Box::leak(Box::new(Arc::new(AtomicBool::new(false))));
	let handler = Arc::clone(flag);
	if ctrlc::set_handler(move || { handler.store(true, Release); }).is_err() {
		Msg::warning("CTRL+C could not be intercepted; aborts will be messy.").eprint();
	}
	KillSwitch::from(flag)
}

/// # Log Header.
///
/// Print a few basic setup details for the log. Only applies when
/// -v/--verbose is set.
fn log_header(disc: &Disc, opts: &DumpOptions) {
	use std::io::Write;

	let writer = std::io::stdout();
	let mut handle = writer.lock();

	// Program version.
	let _res = writeln!(
		&mut handle,
		concat!("#####
## Gap Find v", env!("CARGO_PKG_VERSION"), "
##"),
	);

	// Drive.
	if let Some(v) = disc.drive_vendor_model() {
		let vendor = v.vendor();
		let model = v.model();
		if vendor.is_empty() {
			let _res = writeln!(&mut handle, "## Drive: {model}");
		}
		else {
			let _res = writeln!(&mut handle, "## Drive: [{vendor}] {model}");
		}
	}

	// Everything else!
	let _res = writeln!(
		&mut handle,
		"## Disc:  {disc}
## Date:  {date}
## Steps: {steps}
#####",
		disc=disc.toc().cddb_id(),
		date=FmtUtc2k::now(),
		steps=NiceU32::from(opts.max_steps()),
	);

	let _res = handle.flush();
}

/// # Summarize.
///
/// Print the results, and any caveats.
fn summarize(disc: &Disc, report: &DumpReport, no_summary: bool) {
	if let Some(tag) = report.first_track_pregap() {
		Msg::custom("Pregap", 199, &format!(
			"Captured {} bytes of first track pregap.",
			NiceU32::from(u32::try_from(tag.as_bytes().len()).unwrap_or(u32::MAX)),
		))
			.with_newline(true)
			.eprint();
	}

	if ! report.resolved() {
		Msg::warning("Pregaps could not be calculated; track starts are as listed in the table of contents.")
			.eprint();
		return;
	}

	if ! no_summary { eprintln!("\n{disc}"); }

	if report.inexact_positioning() {
		Msg::warning("The drive does not seem to return subchannel data for the exact sector requested; the pregaps may be off.")
			.eprint();
	}

	let unconverged = report.unconverged();
	if ! unconverged.is_empty() {
		let list: Vec<String> = unconverged.iter().map(|t| format!("#{t:02}")).collect();
		Msg::warning(format!(
			"The pregap search for {} {} did not settle; those values may be short.",
			if list.len() == 1 { "track" } else { "tracks" },
			list.oxford_and(),
		))
			.eprint();
	}

	for file in report.saved() {
		eprintln!(concat!(csi!(dim), "  {}", csi!()), file.display());
	}

	Msg::success("Pregaps resolved.").eprint();
}



/// # Terminal Observer.
///
/// Show first track pregap progress, print the results and problems as they
/// come in, and maybe keep a log.
struct TermObserver<'a> {
	/// # Progress Bar.
	progress: &'a Progless,

	/// # First Pregap Sectors Counted.
	done: u32,

	/// # Log.
	log: Option<DumpLog>,
}

impl DumpObserver for TermObserver<'_> {
	fn notify(&mut self, event: DumpEvent) {
		match event {
			DumpEvent::FirstPregapStart => {
				let _res = self.progress.reset(FIRST_PREGAP_SECTORS);
				self.progress.set_title(Some(Msg::custom("Pregap", 199, "Reading first track pregap…")));
				self.done = 0;
			},
			DumpEvent::FirstPregapProgress { lba, .. } => {
				let now = u32::try_from(lba + 150).unwrap_or(0);
				if self.done < now {
					self.progress.increment_n(now - self.done);
					self.done = now;
				}
				self.progress.set_title(Some(Msg::custom("Pregap", 199, &event.to_string())));
			},
			DumpEvent::FirstPregapDone(_) => {
				self.progress.increment_n(FIRST_PREGAP_SECTORS.saturating_sub(self.done));
				self.progress.finish();
			},
			DumpEvent::Search { track, .. } => {
				Msg::custom(&format!("Track {track:02}"), 199, "Searching for the pregap…").eprint();
			},
			DumpEvent::Pregap { track, pregap } if pregap != 0 => {
				Msg::custom(&format!("Track {track:02}"), 10, &format!(
					"The pregap is {} sectors.",
					NiceU32::from(pregap),
				)).eprint();
			},
			_ => if matches!(event.severity(), Severity::Warning) {
				Msg::warning(event.to_string()).eprint();
			},
		}

		if let Some(log) = self.log.as_mut() { log.notify(event); }
	}
}
