use betatron::sim::bmp::dump_framebuffer;
use betatron::ui::{make_sim, BetatronArgs};
use clap::Parser;
use std::fs;

pub fn main() -> anyhow::Result<()> {
    let args = BetatronArgs::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.debug || args.cpu_debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let toml_string = match &args.config {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };
    let mut sim = make_sim(&toml_string, &args)?;

    sim.run();

    if !args.stats_only {
        println!();
        println!("[Results]");
        print!("{}", sim.shared.ctrl.uart_output());
        println!();
    }

    if args.simtight_format {
        sim.shared.stats.print_simtight();
    } else {
        sim.shared.stats.print_human();
    }

    if let Some(path) = &args.stats_json {
        fs::write(path, serde_json::to_string_pretty(&sim.shared.stats)?)?;
    }

    if let Some(path) = &args.fb_dump {
        let base = args.fb_base.unwrap_or(0);
        dump_framebuffer(
            sim.shared.coalescer.memory(),
            base,
            args.fb_width,
            args.fb_height,
            path,
        )?;
    }

    Ok(())
}
