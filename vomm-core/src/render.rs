// Renders pitch and onset token sequences as a single-track Standard MIDI
// File, optionally alongside a CSV of the notes.
//
// Each non-rest token becomes a note lasting until the next token's onset;
// the final note gets a fixed short duration. Rests only advance time.
// Uses the `midly` crate for MIDI writing.

use std::fs;
use std::path::Path;

use midly::num::{u4, u7, u15, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::error::RenderError;
use crate::events::{REST_TOKEN, format_number};

/// Largest delta a MIDI event can carry.
const MAX_DELTA: u32 = (1 << 28) - 1;

/// Rendering parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
	/// Ticks per quarter-note beat.
	pub ticks_per_beat: u16,
	/// Note-on and note-off velocity.
	pub velocity: u8,
	/// Duration in beats given to the last note.
	pub final_duration: f64,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self { ticks_per_beat: 480, velocity: 64, final_duration: 0.25 }
	}
}

/// One sounding note, times in beats with the onset offset restored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderedNote {
	pub onset: f64,
	pub pitch: u8,
	pub duration: f64,
}

/// A rendered piece: the MIDI track and the notes it contains.
#[derive(Debug)]
pub struct Rendered {
	ticks_per_beat: u16,
	track: Track<'static>,
	notes: Vec<RenderedNote>,
}

impl Rendered {
	pub fn notes(&self) -> &[RenderedNote] {
		&self.notes
	}

	/// Builds the in-memory MIDI file.
	pub fn to_smf(&self) -> Smf<'static> {
		let mut smf = Smf::new(Header::new(
			Format::SingleTrack,
			Timing::Metrical(u15::new(self.ticks_per_beat)),
		));
		smf.tracks.push(self.track.clone());
		smf
	}

	/// Writes the MIDI file to `path`.
	pub fn write_midi<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
		let mut buf = Vec::new();
		self.to_smf().write_std(&mut buf)?;
		fs::write(path, &buf)?;
		Ok(())
	}

	/// Writes one `onset,pitch,duration` row per note to `path`.
	pub fn write_records_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
		let mut contents = String::new();
		for note in &self.notes {
			contents.push_str(&format!(
				"{},{},{}\n",
				format_number(note.onset),
				format_number(f64::from(note.pitch)),
				format_number(note.duration)
			));
		}
		fs::write(path, contents)?;
		Ok(())
	}
}

fn parse_onset(token: &str) -> Result<f64, RenderError> {
	token
		.trim()
		.parse::<f64>()
		.map_err(|_| RenderError::InvalidOnset(token.to_owned()))
}

/// Reads a MIDI note number from a token such as `"60"` or `"60.0"`.
fn parse_pitch(token: &str) -> Result<u8, RenderError> {
	let value = token
		.trim()
		.parse::<f64>()
		.map_err(|_| RenderError::InvalidPitch(token.to_owned()))?;
	if !(0.0..128.0).contains(&value) {
		return Err(RenderError::InvalidPitch(token.to_owned()));
	}
	Ok(value as u8)
}

fn beats_to_ticks(beats: f64, ticks_per_beat: u16) -> u32 {
	let ticks = (beats * f64::from(ticks_per_beat)).max(0.0) as u32;
	ticks.min(MAX_DELTA)
}

fn note_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
	TrackEvent {
		delta: u28::new(delta.min(MAX_DELTA)),
		kind: TrackEventKind::Midi { channel: u4::new(0), message },
	}
}

/// Converts pitch-or-rest tokens and their onsets into a MIDI track.
///
/// `onsets` are relative to `onset_offset`, as produced by
/// `events::extract_sequences`; the offset is added back.
///
/// # Errors
/// - `LengthMismatch` if the sequences differ in length
/// - `InvalidOnset` / `InvalidPitch` for tokens that are not numbers
///   (pitches must also be valid MIDI note numbers)
pub fn render<S, O>(
	pitches: &[S],
	onsets: &[O],
	onset_offset: f64,
	options: &RenderOptions,
) -> Result<Rendered, RenderError>
where
	S: AsRef<str>,
	O: AsRef<str>,
{
	if pitches.len() != onsets.len() {
		return Err(RenderError::LengthMismatch { pitches: pitches.len(), onsets: onsets.len() });
	}

	let onsets = onsets
		.iter()
		.map(|token| parse_onset(token.as_ref()).map(|onset| onset + onset_offset))
		.collect::<Result<Vec<f64>, _>>()?;

	let velocity = u7::new(options.velocity.min(127));
	let mut track: Track<'static> = Vec::new();
	let mut notes = Vec::new();
	// Ticks elapsed since the last emitted event.
	let mut pending: u32 = 0;

	for (i, token) in pitches.iter().enumerate() {
		let token = token.as_ref();
		let onset = onsets[i];
		let next_onset = onsets.get(i + 1).copied().unwrap_or(onset + options.final_duration);
		// Pitch and onset streams are generated independently and may disagree.
		let duration = (next_onset - onset).max(0.0);
		let ticks = beats_to_ticks(duration, options.ticks_per_beat);

		if token == REST_TOKEN {
			pending = pending.saturating_add(ticks);
			continue;
		}

		let key = u7::new(parse_pitch(token)?);
		track.push(note_event(pending, MidiMessage::NoteOn { key, vel: velocity }));
		track.push(note_event(ticks, MidiMessage::NoteOff { key, vel: velocity }));
		pending = 0;

		notes.push(RenderedNote { onset, pitch: key.as_int(), duration });
	}

	track.push(TrackEvent {
		delta: u28::new(0),
		kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
	});

	Ok(Rendered { ticks_per_beat: options.ticks_per_beat, track, notes })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn note_messages(rendered: &Rendered) -> Vec<(u32, MidiMessage)> {
		rendered
			.track
			.iter()
			.filter_map(|event| match event.kind {
				TrackEventKind::Midi { message, .. } => Some((event.delta.as_int(), message)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn test_length_mismatch() {
		let result = render(&tokens("60.0 62.0"), &tokens("0.0"), 0.0, &RenderOptions::default());
		assert!(matches!(result, Err(RenderError::LengthMismatch { pitches: 2, onsets: 1 })));
	}

	#[test]
	fn test_notes_span_until_next_onset() {
		let rendered = render(
			&tokens("60.0 62.0"),
			&tokens("0.0 1.0"),
			4.0,
			&RenderOptions::default(),
		)
		.unwrap();

		assert_eq!(
			rendered.notes(),
			&[
				RenderedNote { onset: 4.0, pitch: 60, duration: 1.0 },
				RenderedNote { onset: 5.0, pitch: 62, duration: 0.25 },
			]
		);

		let key = |k| u7::new(k);
		let vel = u7::new(64);
		assert_eq!(
			note_messages(&rendered),
			vec![
				(0, MidiMessage::NoteOn { key: key(60), vel }),
				(480, MidiMessage::NoteOff { key: key(60), vel }),
				(0, MidiMessage::NoteOn { key: key(62), vel }),
				(120, MidiMessage::NoteOff { key: key(62), vel }),
			]
		);
	}

	#[test]
	fn test_rests_advance_time() {
		let rendered = render(
			&tokens("60.0 r r 64.0"),
			&tokens("0.0 1.0 1.5 2.0"),
			0.0,
			&RenderOptions::default(),
		)
		.unwrap();

		assert_eq!(rendered.notes().len(), 2);
		let messages = note_messages(&rendered);
		// Both rests (0.5 beat each) delay the second note-on.
		assert_eq!(messages[2].0, 480);
	}

	#[test]
	fn test_backwards_onsets_clamp_to_zero() {
		let rendered = render(&tokens("60.0 62.0"), &tokens("2.0 1.0"), 0.0, &RenderOptions::default()).unwrap();
		assert_eq!(rendered.notes()[0].duration, 0.0);
	}

	#[test]
	fn test_invalid_tokens() {
		let options = RenderOptions::default();
		assert!(matches!(
			render(&tokens("abc"), &tokens("0.0"), 0.0, &options),
			Err(RenderError::InvalidPitch(_))
		));
		assert!(matches!(
			render(&tokens("128.0"), &tokens("0.0"), 0.0, &options),
			Err(RenderError::InvalidPitch(_))
		));
		assert!(matches!(
			render(&tokens("60.0"), &tokens("soon"), 0.0, &options),
			Err(RenderError::InvalidOnset(_))
		));
	}

	#[test]
	fn test_write_midi_and_csv() {
		let dir = tempfile::tempdir().unwrap();
		let rendered = render(
			&tokens("60.0 r 62.0"),
			&tokens("0.0 1.0 2.0"),
			0.5,
			&RenderOptions::default(),
		)
		.unwrap();

		let midi_path = dir.path().join("out.mid");
		rendered.write_midi(&midi_path).unwrap();
		let bytes = fs::read(&midi_path).unwrap();
		let smf = Smf::parse(&bytes).unwrap();
		assert_eq!(smf.tracks.len(), 1);
		assert_eq!(smf.tracks[0].len(), 5);

		let csv_path = dir.path().join("out.csv");
		rendered.write_records_csv(&csv_path).unwrap();
		let csv = fs::read_to_string(&csv_path).unwrap();
		assert_eq!(csv, "0.5,60.0,1.0\n2.5,62.0,0.25\n");
	}
}
