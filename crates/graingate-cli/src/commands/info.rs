//! WAV metadata and grain timing at the file's sample rate.

use clap::Args;
use graingate_core::DEFAULT_BPM;
use graingate_engine::{GrainGateParams, dying_fade_samples};
use graingate_io::read_wav_info;
use std::path::PathBuf;

#[derive(Args)]
pub struct InfoArgs {
    /// WAV file to inspect
    file: PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.file)?;
    let sample_rate = info.sample_rate as f32;

    println!("{}", args.file.display());
    println!(
        "  {} {}-bit, {} ch, {} Hz",
        info.format, info.bits_per_sample, info.channels, info.sample_rate
    );
    println!("  {:.3}s ({} frames)", info.duration_secs, info.num_frames);

    if !matches!(info.channels, 1 | 2) {
        println!("  Not processable: graingate takes mono or stereo input");
        return Ok(());
    }

    let params = GrainGateParams::default();
    println!("\nAt {} Hz:", info.sample_rate);
    println!(
        "  Default grain: {} samples",
        params.grain_length_samples(DEFAULT_BPM, sample_rate)
    );
    println!("  Steal fade:    {} samples", dying_fade_samples(sample_rate));

    Ok(())
}
