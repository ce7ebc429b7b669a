//! Grain shape and beat division listing.

use clap::Args;
use graingate_core::{BEAT_DIVISIONS, DEFAULT_DIVISION_INDEX};
use graingate_engine::{GrainGateParams, ParameterInfo, ShapeSelect};

#[derive(Args)]
pub struct ShapesArgs {
    /// Also list every parameter with its range and default
    #[arg(long)]
    params: bool,
}

pub fn run(args: ShapesArgs) -> anyhow::Result<()> {
    println!("Grain Shapes");
    println!("============");
    for shape in ShapeSelect::ALL {
        let marker = if shape == ShapeSelect::default() { " (default)" } else { "" };
        println!("  {}{}", shape.name(), marker);
    }

    println!();
    println!("Beat Divisions (--timebase beats)");
    println!("=================================");
    for (i, division) in BEAT_DIVISIONS.iter().enumerate() {
        let marker = if i == DEFAULT_DIVISION_INDEX { " (default)" } else { "" };
        println!("  {:2}  {:6}  {:.4} beats{}", i, division.label, division.beats, marker);
    }

    if args.params {
        let params = GrainGateParams::default();
        println!();
        println!("Parameters");
        println!("==========");
        println!("  {:20}  {:>10}  {:>10}  {:>10}", "Name", "Min", "Max", "Default");
        for i in 0..params.param_count() {
            if let Some(desc) = params.param_info(i) {
                println!(
                    "  {:20}  {:>10.2}  {:>10.2}  {:>10.2}{}",
                    desc.string_id,
                    desc.min,
                    desc.max,
                    desc.default,
                    desc.unit.suffix()
                );
            }
        }
    }

    Ok(())
}
