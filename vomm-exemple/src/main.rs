use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use vomm_core::events::{Sequences, onset_offset, read_sequences};
use vomm_core::io::{get_filename, list_files};
use vomm_core::render::{RenderOptions, render};
use vomm_core::{GenerateInput, Generation, VariableOrderMarkov};

/// Trains pitch and onset models on every prime/continuation pair but one,
/// then continues the held-out primer and writes the results for comparison.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
	/// Directory of primer CSV files
	#[arg(long, value_name = "DIR")]
	prime_dir: PathBuf,

	/// Directory of true continuation CSV files, named like the primers
	#[arg(long, value_name = "DIR")]
	cont_dir: PathBuf,

	/// Where the per-sample result directory is created
	#[arg(short, long, value_name = "DIR", default_value = "./test_generation")]
	output_dir: PathBuf,

	/// Longest context the models learn
	#[arg(long, default_value_t = 6)]
	max_order: usize,

	/// Number of tokens to generate after the primer
	#[arg(short, long, default_value_t = 30)]
	length: usize,

	/// Longest context tried first during generation (defaults to max-order)
	#[arg(long)]
	order: Option<usize>,

	/// File name of the sample to hold out (random if omitted)
	#[arg(long, value_name = "FILE")]
	held_out: Option<String>,

	/// Seed for held-out selection and sampling
	#[arg(long)]
	seed: Option<u64>,
}

/// A primer and its true continuation, both shifted by the primer's first onset.
struct Sample {
	offset: f64,
	prime: Sequences,
	cont: Sequences,
}

fn load_sample(prime_path: &Path, cont_path: &Path) -> Result<Sample> {
	let offset = onset_offset(prime_path)
		.with_context(|| format!("Failed to read onset offset from {}", prime_path.display()))?;
	let prime = read_sequences(prime_path, offset)
		.with_context(|| format!("Failed to read {}", prime_path.display()))?;
	let cont = read_sequences(cont_path, offset)
		.with_context(|| format!("Failed to read {}", cont_path.display()))?;
	Ok(Sample { offset, prime, cont })
}

/// CSV file names present in both directories.
fn paired_files(prime_dir: &Path, cont_dir: &Path) -> Result<Vec<String>> {
	let primes = list_files(prime_dir, "csv")
		.with_context(|| format!("Failed to list {}", prime_dir.display()))?;
	let conts = list_files(cont_dir, "csv")
		.with_context(|| format!("Failed to list {}", cont_dir.display()))?;

	if primes != conts {
		bail!("prime and continuation directories must hold the same file names");
	}
	if primes.is_empty() {
		bail!("no CSV samples found in {}", prime_dir.display());
	}
	Ok(primes)
}

fn report_halt(label: &str, generation: &Generation<String>) {
	if !generation.is_complete() {
		warn!(
			"{label} generation stopped after {} of {} tokens",
			generation.tokens.len(),
			generation.requested
		);
	}
}

fn run(args: &Args) -> Result<PathBuf> {
	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let files = paired_files(&args.prime_dir, &args.cont_dir)?;
	let held_out = match &args.held_out {
		Some(name) if files.contains(name) => name.clone(),
		Some(name) => bail!("held-out sample {name} is not in {}", args.prime_dir.display()),
		None => files.choose(&mut rng).cloned().context("no samples to hold out")?,
	};
	info!("chose {held_out} as the test sample");

	// Train both models on every other sample
	let mut pitch_corpus = Vec::new();
	let mut onset_corpus = Vec::new();
	for name in files.iter().filter(|name| **name != held_out) {
		let sample = load_sample(&args.prime_dir.join(name), &args.cont_dir.join(name))?;
		let mut full = sample.prime;
		full.extend(sample.cont);
		pitch_corpus.push(full.pitches);
		onset_corpus.push(full.onsets);
	}

	let mut pitch_model = VariableOrderMarkov::new(args.max_order)?;
	let mut onset_model = VariableOrderMarkov::new(args.max_order)?;
	pitch_model.train_corpus(&pitch_corpus);
	onset_model.train_corpus(&onset_corpus);
	info!(
		"trained on {} samples, {} pitch and {} onset tokens",
		pitch_corpus.len(),
		pitch_model.vocabulary().len(),
		onset_model.vocabulary().len()
	);

	// Continue the held-out primer
	let prime_path = args.prime_dir.join(&held_out);
	let cont_path = args.cont_dir.join(&held_out);
	let test = load_sample(&prime_path, &cont_path)?;

	let mut pitch_input = GenerateInput::new(args.length).with_primer(test.prime.pitches.clone());
	let mut onset_input = GenerateInput::new(args.length).with_primer(test.prime.onsets.clone());
	if let Some(order) = args.order {
		pitch_input = pitch_input.with_order(order);
		onset_input = onset_input.with_order(order);
	}
	let pitches = pitch_model.generate(&pitch_input, &mut rng)?;
	let onsets = onset_model.generate(&onset_input, &mut rng)?;
	report_halt("pitch", &pitches);
	report_halt("onset", &onsets);

	let common = pitches.tokens.len().min(onsets.tokens.len());
	if pitches.tokens.len() != onsets.tokens.len() {
		warn!("truncating generated sequences to their common length {common}");
	}

	// Write outputs
	let output = args.output_dir.join(get_filename(&held_out)?);
	fs::create_dir_all(&output).with_context(|| format!("Failed to create {}", output.display()))?;

	let options = RenderOptions::default();
	let generated = render(&pitches.tokens[..common], &onsets.tokens[..common], test.offset, &options)?;
	generated.write_midi(output.join("generated_cont.mid"))?;
	generated.write_records_csv(output.join("generated_cont.csv"))?;

	render(&test.prime.pitches, &test.prime.onsets, test.offset, &options)?.write_midi(output.join("prime.mid"))?;
	render(&test.cont.pitches, &test.cont.onsets, test.offset, &options)?.write_midi(output.join("true_cont.mid"))?;

	fs::copy(&prime_path, output.join("prime.csv"))
		.with_context(|| format!("Failed to copy {}", prime_path.display()))?;
	fs::copy(&cont_path, output.join("true_cont.csv"))
		.with_context(|| format!("Failed to copy {}", cont_path.display()))?;

	Ok(output)
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let output = run(&args)?;
	info!("results written to {}", output.display());
	Ok(())
}
