//! File-based grain gate processing command.

use crate::config::Settings;
use clap::Args;
use graingate_core::{DEFAULT_BPM, linear_to_db};
use graingate_engine::{DEFAULT_SEED, GrainGate, SeedSequence, Transport};
use graingate_io::{StereoSamples, WavSpec, read_wav, write_wav};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file (mono or stereo)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Key / alternate input (defaults to the main input)
    #[arg(long, value_name = "FILE")]
    sidechain: Option<PathBuf>,

    /// Settings file (TOML); flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Grain shape (hann, triangle, blackman, rectangular, exponential, adsr)
    #[arg(short, long)]
    shape: Option<String>,

    /// Grain length in milliseconds
    #[arg(long, value_name = "MS")]
    grain_ms: Option<f32>,

    /// Grain length unit: ms or beats
    #[arg(long)]
    timebase: Option<String>,

    /// Beat division label for --timebase beats (e.g. 1/16, 1/8T)
    #[arg(long, value_name = "LABEL")]
    division: Option<String>,

    /// Tempo for the beat grid
    #[arg(long)]
    bpm: Option<f32>,

    /// Randomization amount (0-1)
    #[arg(long)]
    randomness: Option<f32>,

    /// Fraction of grains rendering the sidechain (0-1)
    #[arg(long)]
    crossfade: Option<f32>,

    /// Detector threshold in dB
    #[arg(long, value_name = "DB", allow_hyphen_values = true)]
    threshold: Option<f32>,

    /// Trigger on detector edges instead of grid points
    #[arg(long)]
    no_lock: bool,

    /// Decide left and right channels independently
    #[arg(long)]
    decorrelate: bool,

    /// ADSR attack in ms
    #[arg(long, value_name = "MS")]
    attack: Option<f32>,

    /// ADSR decay in ms
    #[arg(long, value_name = "MS")]
    decay: Option<f32>,

    /// ADSR sustain level (0-1)
    #[arg(long)]
    sustain: Option<f32>,

    /// ADSR release in ms
    #[arg(long, value_name = "MS")]
    release: Option<f32>,

    /// First random seed; the right channel takes the next one
    #[arg(long)]
    seed: Option<u64>,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

impl ProcessArgs {
    fn flag_settings(&self) -> Settings {
        Settings {
            shape: self.shape.clone(),
            grain_ms: self.grain_ms,
            attack_ms: self.attack,
            decay_ms: self.decay,
            sustain: self.sustain,
            release_ms: self.release,
            randomness: self.randomness,
            beat_division: self.division.clone(),
            timebase: self.timebase.clone(),
            lock_to_grid: self.no_lock.then_some(false),
            stereo_correlation: self.decorrelate.then_some(false),
            crossfade: self.crossfade,
            threshold_db: self.threshold,
            bpm: self.bpm,
            seed: self.seed,
        }
    }
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    if args.block_size == 0 {
        anyhow::bail!("--block-size must be at least 1");
    }

    let file_settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let settings = file_settings.merged_with(args.flag_settings());
    let params = settings.to_params()?;

    // Read input file
    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} ch, {} Hz, {:.2}s",
        input.len(),
        spec.channels,
        spec.sample_rate,
        input.len() as f32 / sample_rate
    );

    let key = match &args.sidechain {
        Some(path) => {
            let (mut key, key_spec) = read_wav(path)?;
            if key_spec.sample_rate != spec.sample_rate {
                anyhow::bail!(
                    "sidechain sample rate {} Hz does not match input {} Hz",
                    key_spec.sample_rate,
                    spec.sample_rate
                );
            }
            if key.len() != input.len() {
                tracing::warn!(
                    key_frames = key.len(),
                    input_frames = input.len(),
                    "sidechain length differs from input, padding or truncating"
                );
            }
            key.fit_to(input.len());
            key
        }
        None => input.clone(),
    };

    let bpm = settings.bpm.unwrap_or(DEFAULT_BPM);
    let mut seeds = SeedSequence::new(settings.seed.unwrap_or(DEFAULT_SEED));
    let mut gate = GrainGate::new(sample_rate, &mut seeds);
    gate.set_params(&params);
    gate.set_transport(Transport {
        bpm,
        ppq: Some(0.0),
        playing: true,
    });

    tracing::info!(
        shape = params.shape.name(),
        grain_length = gate.grain_length(),
        hop = gate.hop(),
        seeds = ?gate.seeds(),
        "processing"
    );

    // Process with progress bar
    let pb = ProgressBar::new(input.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let block_size = args.block_size;
    let mut output = StereoSamples::silence(input.len());
    let mut done = 0;
    for ((((a_l, a_r), (b_l, b_r)), out_l), out_r) in input
        .left
        .chunks(block_size)
        .zip(input.right.chunks(block_size))
        .zip(key.left.chunks(block_size).zip(key.right.chunks(block_size)))
        .zip(output.left.chunks_mut(block_size))
        .zip(output.right.chunks_mut(block_size))
    {
        gate.process_block(a_l, a_r, b_l, b_r, out_l, out_r);
        done += a_l.len();
        pb.set_position(done as u64);
    }

    pb.finish_with_message("done");

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(input.rms()),
        linear_to_db(input.peak())
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(output.rms()),
        linear_to_db(output.peak())
    );
    println!(
        "  Grains: {} triggered, {} stolen",
        gate.grains_triggered(),
        gate.steal_count()
    );

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}
