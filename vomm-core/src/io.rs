use std::ffi::OsStr;
use std::path::Path;
use std::{fs, io};

/// Lines of a note event file, line endings stripped.
///
/// Event CSVs exported on Windows end in `\r\n`; both forms yield the same rows.
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let contents = fs::read_to_string(filename)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Sample name used for its result directory: `prime_csv/3b5e.csv` gives `3b5e`.
pub fn get_filename<P: AsRef<Path>>(sample: P) -> io::Result<String> {
	match sample.as_ref().file_stem() {
		Some(stem) => Ok(stem.to_string_lossy().into_owned()),
		None => Err(io::Error::new(io::ErrorKind::InvalidInput, "sample path has no file name")),
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted so that two directories
/// holding the same names list them in the same order.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}
