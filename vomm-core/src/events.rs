use std::path::Path;

use crate::error::EventError;
use crate::io::read_file;

/// Token inserted wherever silence separates two events.
pub const REST_TOKEN: &str = "r";

// Column layout of an event row.
const ONSET: usize = 0;
const PITCH: usize = 1;
const MORPHETIC: usize = 2;
const DURATION: usize = 3;
const CHANNEL: usize = 4;

/// One note from a tabular event source.
///
/// Times are in quarter-note beats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
	pub onset: f64,
	/// MIDI note number.
	pub pitch: f64,
	/// Morphetic pitch number, carried along but unused for token extraction.
	pub morphetic: f64,
	pub duration: f64,
	/// MIDI channel, `0.0` when the row has no channel column.
	pub channel: f64,
}

/// Parallel pitch-or-rest and onset token sequences of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequences {
	pub pitches: Vec<String>,
	pub onsets: Vec<String>,
}

impl Sequences {
	pub fn len(&self) -> usize {
		self.pitches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pitches.is_empty()
	}

	/// Appends `other` after `self`, e.g. a continuation after its prime.
	pub fn extend(&mut self, other: Sequences) {
		self.pitches.extend(other.pitches);
		self.onsets.extend(other.onsets);
	}
}

/// Encodes a number as a token. Always keeps a fractional part (`60.0`).
pub fn format_number(value: f64) -> String {
	format!("{value:?}")
}

fn is_blank(line: &str) -> bool {
	line.split(',').all(|cell| cell.trim().is_empty())
}

fn parse_cell(cell: &str, line: usize) -> Result<f64, EventError> {
	let cell = cell.trim();
	cell.parse::<f64>()
		.map_err(|_| EventError::Parse { line, value: cell.to_owned() })
}

/// Parses event rows, skipping blank lines.
///
/// Line numbers in errors are 1-based.
pub fn parse_events<S: AsRef<str>>(lines: &[S]) -> Result<Vec<NoteEvent>, EventError> {
	let mut events = Vec::new();

	for (index, line) in lines.iter().enumerate() {
		let line = line.as_ref();
		if is_blank(line) {
			continue;
		}

		let number = index + 1;
		let cells = line
			.split(',')
			.map(|cell| parse_cell(cell, number))
			.collect::<Result<Vec<f64>, _>>()?;

		if cells.len() <= DURATION {
			return Err(EventError::MissingColumns {
				line: number,
				expected: DURATION + 1,
				found: cells.len(),
			});
		}

		events.push(NoteEvent {
			onset: cells[ONSET],
			pitch: cells[PITCH],
			morphetic: cells[MORPHETIC],
			duration: cells[DURATION],
			channel: cells.get(CHANNEL).copied().unwrap_or(0.0),
		});
	}

	Ok(events)
}

/// Reads every event of a CSV file.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<NoteEvent>, EventError> {
	parse_events(&read_file(path)?)
}

/// Onset of the first non-blank row.
///
/// Sources do not necessarily start at 0. Subtracting this value from every
/// onset of a piece makes all pieces start at 0, so they can share a model.
///
/// # Errors
/// Returns `EventError::NoRows` if the file has no non-blank row.
pub fn onset_offset<P: AsRef<Path>>(path: P) -> Result<f64, EventError> {
	let lines = read_file(path)?;
	let (index, line) = lines
		.iter()
		.enumerate()
		.find(|(_, line)| !is_blank(line))
		.ok_or(EventError::NoRows)?;

	let cell = line.split(',').nth(ONSET).unwrap_or_default();
	parse_cell(cell, index + 1)
}

/// Turns events into pitch and onset token sequences.
///
/// Every event contributes its pitch and its onset shifted by `onset_offset`.
/// When the next event starts after the current one ends, a `REST_TOKEN`
/// is inserted at the end of the current event.
pub fn extract_sequences(events: &[NoteEvent], onset_offset: f64) -> Sequences {
	let mut sequences = Sequences::default();

	for (i, event) in events.iter().enumerate() {
		let onset = event.onset - onset_offset;
		sequences.pitches.push(format_number(event.pitch));
		sequences.onsets.push(format_number(onset));

		if let Some(next) = events.get(i + 1) {
			let next_onset = next.onset - onset_offset;
			let end = onset + event.duration;
			if next_onset - end > 0.0 {
				sequences.pitches.push(REST_TOKEN.to_owned());
				sequences.onsets.push(format_number(end));
			}
		}
	}

	sequences
}

/// Reads a CSV file straight into token sequences.
pub fn read_sequences<P: AsRef<Path>>(path: P, onset_offset: f64) -> Result<Sequences, EventError> {
	Ok(extract_sequences(&read_events(path)?, onset_offset))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn event(onset: f64, pitch: f64, duration: f64) -> NoteEvent {
		NoteEvent { onset, pitch, morphetic: 0.0, duration, channel: 0.0 }
	}

	#[test]
	fn test_format_number_keeps_fraction() {
		assert_eq!(format_number(60.0), "60.0");
		assert_eq!(format_number(1.5), "1.5");
		assert_eq!(format_number(0.0), "0.0");
	}

	#[test]
	fn test_parse_events_skips_blank_lines() {
		let lines = ["", "0,60,60,1,0", " , ", "1,62,61,0.5"];
		let events = parse_events(&lines).unwrap();
		assert_eq!(events.len(), 2);
		assert_eq!(events[0], NoteEvent { onset: 0.0, pitch: 60.0, morphetic: 60.0, duration: 1.0, channel: 0.0 });
		assert_eq!(events[1].duration, 0.5);
	}

	#[test]
	fn test_parse_events_reports_line() {
		let lines = ["0,60,60,1,0", "1,sixty,60,1,0"];
		match parse_events(&lines) {
			Err(EventError::Parse { line, value }) => {
				assert_eq!(line, 2);
				assert_eq!(value, "sixty");
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn test_parse_events_requires_duration() {
		let lines = ["0,60,60"];
		assert!(matches!(
			parse_events(&lines),
			Err(EventError::MissingColumns { line: 1, expected: 4, found: 3 })
		));
	}

	#[test]
	fn test_extract_inserts_rests_on_gaps() {
		let events = [event(10.0, 60.0, 1.0), event(11.0, 62.0, 0.5), event(12.0, 64.0, 1.0)];
		let sequences = extract_sequences(&events, 10.0);

		assert_eq!(sequences.pitches, vec!["60.0", "62.0", "r", "64.0"]);
		assert_eq!(sequences.onsets, vec!["0.0", "1.0", "1.5", "2.0"]);
	}

	#[test]
	fn test_extract_without_gaps_has_no_rests() {
		let events = [event(0.0, 60.0, 2.0), event(1.0, 62.0, 1.0)];
		let sequences = extract_sequences(&events, 0.0);
		assert_eq!(sequences.pitches, vec!["60.0", "62.0"]);
		assert_eq!(sequences.len(), sequences.onsets.len());
	}

	#[test]
	fn test_extend_concatenates() {
		let mut prime = extract_sequences(&[event(0.0, 60.0, 1.0)], 0.0);
		let cont = extract_sequences(&[event(1.0, 62.0, 1.0)], 0.0);
		prime.extend(cont);
		assert_eq!(prime.pitches, vec!["60.0", "62.0"]);
		assert_eq!(prime.onsets, vec!["0.0", "1.0"]);
	}
}
