/*!
# Gap Find: Pregap Search
*/

use crate::{
	CD_LEADIN,
	DumpEvent,
	DumpObserver,
	DumpOptions,
	KillSwitch,
	QChannel,
	RETRIES,
	SubchannelFetcher,
	SubchannelSupport,
	SubQEncoding,
	Track,
	Transport,
};
use dactyl::NoHash;
use serde::{
	Deserialize,
	Serialize,
};
use std::collections::HashMap;



/// # Seek-Away Distance.
///
/// Reading a sector a little ways off before each probe forces the drive to
/// actually reposition rather than hand back whatever it last had.
const SEEK_AWAY: i32 = 10;



#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
/// # Pregap Report.
///
/// The odds and ends from a pregap pass worth passing along to the user.
pub struct PregapReport {
	/// # Pregaps Resolved?
	resolved: bool,

	/// # Inexact Positioning?
	inexact: bool,

	/// # Tracks That Hit the Ceiling.
	unconverged: Vec<u8>,
}

impl PregapReport {
	#[must_use]
	/// # Resolved?
	///
	/// Returns `false` if the pass never got going, either because the drive
	/// has no usable subchannel or its Q encoding could not be determined.
	pub const fn resolved(&self) -> bool { self.resolved }

	#[must_use]
	/// # Inexact Positioning?
	///
	/// Returns `true` if the drive ever returned Q for a sector other than
	/// the one requested.
	pub const fn inexact_positioning(&self) -> bool { self.inexact }

	#[must_use]
	/// # Unconverged Tracks.
	///
	/// Track numbers whose search was cut short by the step ceiling. Their
	/// pregaps are whatever the search had settled on at that point.
	pub fn unconverged(&self) -> &[u8] { &self.unconverged }
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Search State.
enum SearchState {
	/// # Walking Backward (Initial).
	Scanning,

	/// # Walking Backward Past Non-Position Q.
	SeekingBack,

	/// # Walking Forward After Overshooting.
	SeekingForward,
}



/// # Solve Pregaps.
///
/// Work out the pregap for every track after the first by reading the Q
/// subchannel around its listed start, then move each track's start back to
/// meet it.
///
/// Track starts are only adjusted at the very end; every search uses the
/// table-of-contents positions as its reference.
///
/// This never fails; read problems are reported to the observer and, at
/// worst, leave a track's pregap at zero.
pub fn solve_pregaps<T, O>(
	dev: &mut T,
	support: SubchannelSupport,
	tracks: &mut [Track],
	opts: &DumpOptions,
	killed: &KillSwitch,
	observer: &mut O,
) -> PregapReport
where T: Transport, O: DumpObserver + ?Sized {
	let Some(mode) = support.mode() else { return PregapReport::default(); };
	let mut fetch = SubchannelFetcher::new(dev, mode, opts.plextor());

	let Ok(encoding) = SubQEncoding::probe(&mut fetch) else {
		observer.notify(DumpEvent::EncodingUnknown);
		return PregapReport::default();
	};
	observer.notify(DumpEvent::Encoding(encoding));

	let toc: Vec<Track> = tracks.to_vec();
	let mut pregaps: HashMap<u8, u32, NoHash> = HashMap::with_hasher(NoHash::default());
	let mut search = PregapSearch {
		fetch,
		encoding,
		observer,
		max_steps: opts.max_steps(),
		inexact: false,
		unconverged: Vec::new(),
	};

	for track in &toc {
		let Some(prev) = track.sequence().checked_sub(1)
			.and_then(|seq| toc.iter().find(|t| t.sequence() == seq))
		else { continue; };

		if killed.killed() {
			search.observer.notify(DumpEvent::Aborted);
			break;
		}

		let pregap =
			if search.is_zero(*track, *prev) {
				search.observer.notify(DumpEvent::ZeroPregap(track.sequence()));
				0
			}
			else { search.search(*track, *prev) };
		pregaps.insert(track.sequence(), pregap);
	}

	// Now that the searching is done, move the starts.
	for track in tracks.iter_mut() {
		let pregap = pregaps.get(&track.sequence()).copied().unwrap_or(0);
		track.apply_pregap(pregap);
		if 1 < track.sequence() {
			search.observer.notify(DumpEvent::Pregap {
				track: track.sequence(),
				pregap,
			});
		}
	}

	PregapReport {
		resolved: true,
		inexact: search.inexact,
		unconverged: search.unconverged,
	}
}



/// # Pregap Search.
///
/// The per-track search state shared across the whole pass.
struct PregapSearch<'a, 'b, T: Transport, O: DumpObserver + ?Sized> {
	/// # Fetcher.
	fetch: SubchannelFetcher<'a, T>,

	/// # Q Encoding.
	encoding: SubQEncoding,

	/// # Observer.
	observer: &'b mut O,

	/// # Step Ceiling.
	max_steps: u32,

	/// # Inexact Positioning Seen?
	inexact: bool,

	/// # Tracks That Hit the Ceiling.
	unconverged: Vec<u8>,
}

impl<T: Transport, O: DumpObserver + ?Sized> PregapSearch<'_, '_, T, O> {
	/// # Zero Pregap?
	///
	/// Read the sector immediately before the track. If the drive reports
	/// it as part of the previous track's program area, and at exactly the
	/// right spot, there is no pregap to look for.
	fn is_zero(&mut self, track: Track, prev: Track) -> bool {
		let lba = track.start_sector() - 1;
		for _ in 0..RETRIES {
			let Some(q) = self.fetch.fetch(lba).ok()
				.and_then(|sub| sub.validate(self.encoding, lba).ok())
				.filter(QChannel::is_position)
			else { continue; };

			return
				q.track() == prev.sequence() &&
				q.index() != 0 &&
				q.absolute_lba() == lba;
		}

		false
	}

	/// # Search.
	///
	/// Walk the sectors preceding the track, tracking the largest pregap
	/// any of them claims, until the same value turns up twice in a row.
	fn search(&mut self, track: Track, prev: Track) -> u32 {
		let seq = track.sequence();
		let floor = prev.start_sector();
		let mut lba = track.start_sector() - i32::from(CD_LEADIN);
		let mut state = SearchState::Scanning;
		let mut pregap = 0;
		let mut steps = 0;

		self.observer.notify(DumpEvent::Search { track: seq, lba });
		while floor < lba {
			if steps == self.max_steps {
				self.observer.notify(DumpEvent::Ceiling { track: seq, steps });
				self.unconverged.push(seq);
				break;
			}
			steps += 1;

			// Anything other than position data is useless; step over it.
			let Some(q) = self.read(lba).filter(QChannel::is_position) else {
				if matches!(state, SearchState::SeekingForward) {
					lba += 1;
					if lba == floor { break; }
				}
				else {
					state = SearchState::SeekingBack;
					lba -= 1;
				}
				continue;
			};

			// Too far back.
			if q.track() < seq {
				if matches!(state, SearchState::SeekingBack) {
					state = SearchState::SeekingForward;
				}
				lba += 1;
			}
			// Too far forward.
			else if q.track() == seq && 0 < q.index() { lba -= 1; }
			// In the pregap, which counts down to index one.
			else {
				let candidate = q.relative().sectors().unsigned_abs() + 1;
				let actual = q.absolute_lba();
				if actual != lba {
					self.inexact = true;
					self.observer.notify(DumpEvent::Inexact { lba, actual });
				}

				if candidate == pregap { break; }
				if pregap < candidate {
					pregap = candidate;
					self.observer.notify(DumpEvent::Candidate {
						track: seq,
						lba,
						pregap,
					});
				}
				lba -= 1;
			}
		}

		pregap
	}

	/// # Read Position.
	///
	/// Seek away, then try to read a CRC-valid Q for `lba`. If that never
	/// works out, the last thing the drive returned is decoded as-is.
	fn read(&mut self, lba: i32) -> Option<QChannel> {
		let _res = self.fetch.fetch(lba - SEEK_AWAY);

		let mut last = None;
		for _ in 0..RETRIES {
			if let Ok(sub) = self.fetch.fetch(lba) {
				match sub.validate(self.encoding, lba) {
					Ok(q) => return Some(q),
					Err(_) => { last.replace(sub); },
				}
			}
		}

		self.observer.notify(DumpEvent::Unreadable(lba));
		last.map(|sub| sub.decode_unchecked(self.encoding))
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		build_q,
		build_q_catalog,
		mock::{
			kill_flag,
			MockDrive,
		},
		SubQ,
	};
	use std::sync::atomic::Ordering::Release;

	/// # Raw Support.
	const RAW: SubchannelSupport = SubchannelSupport { raw: true, q16: false };

	/// # Simulated Disc.
	///
	/// Q for a disc laid out as `(track, index one, pregap)`, with pregap
	/// relative time counting down towards index one.
	fn disc_q(layout: &'static [(u8, i32, i32)], encoding: SubQEncoding)
	-> impl FnMut(i32, u32) -> Option<SubQ> {
		move |lba, _| {
			let &(track, idx1, gap) = layout.iter()
				.rev()
				.find(|(_, idx1, gap)| idx1 - gap <= lba)?;
			Some(
				if lba < idx1 { build_q(encoding, track, 0, idx1 - lba - 1, lba) }
				else { build_q(encoding, track, 1, lba - idx1, lba) }
			)
		}
	}

	/// # Two-Track Q.
	///
	/// Track two starts at 1000. The sector before it claims to be track two
	/// (so there is a pregap), sectors `701..=850` count up from `0` to `149`,
	/// and sector 700 repeats 149.
	fn scenario_q(encoding: SubQEncoding) -> impl FnMut(i32, u32) -> Option<SubQ> {
		move |lba, _| Some(match lba {
			999 => build_q(encoding, 2, 1, 0, 5000),
			701..=850 => build_q(encoding, 2, 0, 850 - lba, lba),
			700 => build_q(encoding, 2, 0, 149, lba),
			_ => build_q(encoding, 1, 1, 0, lba),
		})
	}

	/// # Run It.
	fn solve<F>(q: F, support: SubchannelSupport, tracks: &mut [Track], max_steps: u32)
	-> (PregapReport, Vec<DumpEvent>, MockDrive)
	where F: FnMut(i32, u32) -> Option<SubQ> + 'static {
		let mut dev = MockDrive::new(q);
		let mut events = Vec::new();
		let opts = DumpOptions::default().with_max_steps(max_steps);
		let killed = KillSwitch::from(kill_flag());
		let report = solve_pregaps(&mut dev, support, tracks, &opts, &killed, &mut events);
		(report, events, dev)
	}

	/// # Candidates.
	fn candidates(events: &[DumpEvent]) -> Vec<u32> {
		events.iter()
			.filter_map(|e| match e {
				DumpEvent::Candidate { pregap, .. } => Some(*pregap),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn t_scenario() {
		for (encoding, support) in [
			(SubQEncoding::Bcd, RAW),
			(SubQEncoding::Binary, RAW),
			(SubQEncoding::Bcd, SubchannelSupport { raw: false, q16: true }),
		] {
			let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
			let (report, events, _) = solve(scenario_q(encoding), support, &mut tracks, 45_000);

			assert!(report.resolved(), "The pass should have run.");
			assert!(! report.inexact_positioning(), "Positioning should be exact.");
			assert!(report.unconverged().is_empty(), "Nothing should hit the ceiling.");

			assert_eq!(tracks[0], Track::new(1, 0), "Track one should never change.");
			assert_eq!(tracks[1].pregap_sectors(), 150, "Wrong pregap ({encoding}).");
			assert_eq!(tracks[1].start_sector(), 850, "Wrong start ({encoding}).");
			assert!(events.contains(&DumpEvent::Encoding(encoding)));
			assert!(events.contains(&DumpEvent::Pregap { track: 2, pregap: 150 }));
		}
	}

	#[test]
	fn t_zero() {
		// The sector before track two is track one, index one, right where it
		// ought to be.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, dev) = solve(
			|lba, _| Some(build_q(SubQEncoding::Bcd, 1, 1, lba, lba)),
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(report.resolved());
		assert_eq!(tracks[1], Track::new(2, 1000), "Track two should be untouched.");
		assert!(events.contains(&DumpEvent::ZeroPregap(2)));
		assert_eq!(dev.reads_at(850), 0, "The search should have been skipped.");
		assert_eq!(dev.reads_at(840), 0, "The search should have been skipped.");
	}

	#[test]
	fn t_monotonic() {
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (_, events, dev) = solve(
			|lba, _| Some(match lba {
				999 => build_q(SubQEncoding::Bcd, 2, 1, 0, 5000),
				850 => build_q(SubQEncoding::Bcd, 2, 0, 4, lba),
				849 => build_q(SubQEncoding::Bcd, 2, 0, 2, lba),
				847 | 848 => build_q(SubQEncoding::Bcd, 2, 0, 6, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			45_000,
		);

		// The smaller value at 849 should have been ignored.
		assert_eq!(candidates(&events), vec![5, 7], "Candidates should only grow.");
		assert!(candidates(&events).windows(2).all(|w| w[0] <= w[1]));

		// The repeat at 847 should have ended things.
		assert_eq!(tracks[1].pregap_sectors(), 7);
		assert_eq!(tracks[1].start_sector(), 993);
		assert_eq!(dev.reads_at(846), 0, "The search should have stopped at 847.");
	}

	#[test]
	fn t_layout() {
		/// # Layout.
		///
		/// Pregaps bigger than, equal to, and smaller than the initial 150
		/// sector guess.
		const LAYOUT: &[(u8, i32, i32)] = &[
			(1, 0, 0),
			(2, 1000, 200),
			(3, 2000, 0),
			(4, 3000, 75),
			(5, 4000, 150),
		];

		for encoding in [SubQEncoding::Bcd, SubQEncoding::Binary] {
			let mut tracks: Vec<Track> = LAYOUT.iter()
				.map(|&(t, idx1, _)| Track::new(t, idx1))
				.collect();
			let (report, events, _) = solve(disc_q(LAYOUT, encoding), RAW, &mut tracks, 45_000);

			assert!(report.resolved());
			assert!(! report.inexact_positioning());
			for (track, &(t, idx1, gap)) in tracks.iter().zip(LAYOUT) {
				assert_eq!(track.sequence(), t);
				assert_eq!(
					track.pregap_sectors(),
					gap.unsigned_abs(),
					"Wrong pregap for track {t} ({encoding}).",
				);
				assert_eq!(track.start_sector(), idx1 - gap);
				assert_eq!(track.index_one(), idx1);
			}
			assert!(events.contains(&DumpEvent::ZeroPregap(3)));
		}
	}

	#[test]
	fn t_zero_crc() {
		// The sector before track two would confirm a zero pregap if its CRC
		// were any good.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, dev) = solve(
			|lba, _| Some(match lba {
				999 => {
					let mut q = *build_q(SubQEncoding::Bcd, 1, 1, 999, lba).as_bytes();
					q[11] ^= 0b0000_0001;
					SubQ::from(q)
				},
				701..=850 => build_q(SubQEncoding::Bcd, 2, 0, 850 - lba, lba),
				700 => build_q(SubQEncoding::Bcd, 2, 0, 149, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(report.resolved());
		assert!(! events.contains(&DumpEvent::ZeroPregap(2)), "Bad CRC confirmed a zero pregap.");
		assert_eq!(dev.reads_at(999), 10, "Expected one read per retry.");
		assert!(0 < dev.reads_at(850), "The search should have run.");
		assert_eq!(tracks[1].pregap_sectors(), 150);
		assert_eq!(tracks[1].start_sector(), 850);
	}

	#[test]
	fn t_seek_forward() {
		// Sector 850 has no position data, so the search backs up into track
		// one, turns around, steps over 850 again, and settles at 851.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, dev) = solve(
			|lba, _| Some(match lba {
				999 => build_q(SubQEncoding::Bcd, 2, 1, 0, lba),
				851..=998 => build_q(SubQEncoding::Bcd, 2, 0, 998 - lba, lba),
				850 => build_q_catalog(SubQEncoding::Bcd, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(report.resolved());
		assert!(report.unconverged().is_empty(), "Nothing should hit the ceiling.");
		assert_eq!(
			events.iter()
				.filter(|e| matches!(e, DumpEvent::Candidate { .. }))
				.collect::<Vec<_>>(),
			vec![&DumpEvent::Candidate { track: 2, lba: 851, pregap: 148 }],
			"Expected a single candidate from 851.",
		);
		assert_eq!(dev.reads_at(849), 1, "Track one should have been visited once.");
		assert_eq!(tracks[1].pregap_sectors(), 148);
		assert_eq!(tracks[1].start_sector(), 852);
	}

	#[test]
	fn t_ceiling() {
		// Sectors 850 and 851 point at each other forever.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, _) = solve(
			|lba, _| Some(match lba {
				999 => build_q(SubQEncoding::Bcd, 2, 1, 0, 5000),
				851 => build_q(SubQEncoding::Bcd, 2, 1, 0, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			150,
		);

		assert!(report.resolved());
		assert_eq!(report.unconverged(), &[2]);
		assert!(events.contains(&DumpEvent::Ceiling { track: 2, steps: 150 }));
		assert_eq!(tracks[1], Track::new(2, 1000), "No pregap should have been found.");
	}

	#[test]
	fn t_unreadable() {
		// Sector 850 never reads; the search should back up past it.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (_, events, dev) = solve(
			|lba, _| match lba {
				850 => None,
				999 => Some(build_q(SubQEncoding::Bcd, 2, 1, 0, 5000)),
				848 | 849 => Some(build_q(SubQEncoding::Bcd, 2, 0, 149, lba)),
				_ => Some(build_q(SubQEncoding::Bcd, 1, 1, 0, lba)),
			},
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(events.contains(&DumpEvent::Unreadable(850)));
		assert_eq!(dev.reads_at(850), 40, "Expected ten rounds of four reads.");
		assert_eq!(tracks[1].pregap_sectors(), 150);
		assert_eq!(tracks[1].start_sector(), 850);
	}

	#[test]
	fn t_corrupt() {
		// Sector 850 always has a bad CRC, but is otherwise fine; its content
		// should still be used.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (_, events, _) = solve(
			|lba, _| Some(match lba {
				850 => {
					let mut q = *build_q(SubQEncoding::Bcd, 2, 0, 0, lba).as_bytes();
					q[11] ^= 0b0000_0001;
					SubQ::from(q)
				},
				999 => build_q(SubQEncoding::Bcd, 2, 1, 0, 5000),
				848 | 849 => build_q(SubQEncoding::Bcd, 2, 0, 1, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(events.contains(&DumpEvent::Unreadable(850)));
		assert_eq!(candidates(&events), vec![1, 2]);
		assert_eq!(tracks[1].pregap_sectors(), 2);
	}

	#[test]
	fn t_inexact() {
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, _) = solve(
			|lba, _| Some(match lba {
				999 => build_q(SubQEncoding::Bcd, 2, 1, 0, 5000),
				850 => build_q(SubQEncoding::Bcd, 2, 0, 149, 852),
				849 => build_q(SubQEncoding::Bcd, 2, 0, 149, lba),
				_ => build_q(SubQEncoding::Bcd, 1, 1, 0, lba),
			}),
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(report.inexact_positioning(), "Positioning should be flagged.");
		assert!(events.contains(&DumpEvent::Inexact { lba: 850, actual: 852 }));
		assert_eq!(tracks[1].pregap_sectors(), 150);
	}

	#[test]
	fn t_no_encoding() {
		// Sector 11 never reads, so nothing else should happen.
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, dev) = solve(
			|lba, _|
				if lba == 11 { None }
				else { Some(build_q(SubQEncoding::Bcd, 1, 1, 0, lba)) },
			RAW,
			&mut tracks,
			45_000,
		);

		assert!(! report.resolved());
		assert_eq!(events, vec![DumpEvent::EncodingUnknown]);
		assert!(dev.reads.iter().all(|(lba, _)| *lba == 11), "Only sector 11 should be read.");
		assert_eq!(tracks, [Track::new(1, 0), Track::new(2, 1000)]);
	}

	#[test]
	fn t_no_subchannel() {
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let (report, events, dev) = solve(
			scenario_q(SubQEncoding::Bcd),
			SubchannelSupport::default(),
			&mut tracks,
			45_000,
		);

		assert!(! report.resolved());
		assert!(events.is_empty(), "Nothing should have been reported.");
		assert!(dev.reads.is_empty(), "Nothing should have been read.");
		assert_eq!(tracks, [Track::new(1, 0), Track::new(2, 1000)]);
	}

	#[test]
	fn t_killed() {
		let flag = kill_flag();
		flag.store(true, Release);
		let killed = KillSwitch::from(flag);

		let mut dev = MockDrive::new(scenario_q(SubQEncoding::Bcd));
		let mut events = Vec::new();
		let mut tracks = [Track::new(1, 0), Track::new(2, 1000)];
		let report = solve_pregaps(
			&mut dev,
			RAW,
			&mut tracks,
			&DumpOptions::default(),
			&killed,
			&mut events,
		);

		assert!(report.resolved());
		assert!(events.contains(&DumpEvent::Aborted));
		assert_eq!(dev.reads_at(999), 0, "Track two should not have been searched.");
		assert_eq!(tracks[1], Track::new(2, 1000));
	}
}
