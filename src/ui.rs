use crate::sim::config::{Config, SimConfig};
use crate::sim::elf::load_elf;
use crate::sim::top::SimTop;
use crate::sim::trace::Tracer;
use crate::simt::config::SimtConfig;
use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toml::Table;

#[derive(Parser)]
#[command(version, about = "A software simulator for a RISC-V SIMT GPU")]
pub struct BetatronArgs {
    #[arg(help = "RISC-V ELF binary to run")]
    pub elf: Option<PathBuf>,
    #[arg(long, help = "Path to config.toml")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Override number of lanes per warp")]
    pub num_lanes: Option<usize>,
    #[arg(long, help = "Override number of warps")]
    pub num_warps: Option<usize>,
    #[arg(long, help = "Override the cycle timeout")]
    pub timeout: Option<u64>,
    #[arg(short, long, help = "Turn on debugging logs")]
    pub debug: bool,
    #[arg(short, long, help = "Turn on CPU debugging logs")]
    pub cpu_debug: bool,
    #[arg(short, long, help = "Dump register values after each writeback")]
    pub regdump: bool,
    #[arg(short, long, help = "Print nothing aside from the final stats")]
    pub stats_only: bool,
    #[arg(long, help = "Output statistics in the reference UART format (hex, 8 digits)")]
    pub simtight_format: bool,
    #[arg(long, help = "Write statistics as JSON to this path")]
    pub stats_json: Option<PathBuf>,
    #[arg(long, help = "Write a memory-traffic trace CSV to this path")]
    pub trace: Option<PathBuf>,
    #[arg(long, help = "Bytes fed to the simulated input CSR")]
    pub input: Option<String>,
    #[arg(long, help = "Dump the framebuffer to this BMP path after the run")]
    pub fb_dump: Option<PathBuf>,
    #[arg(long, help = "Framebuffer base address", value_parser = parse_u64_maybe_hex)]
    pub fb_base: Option<u64>,
    #[arg(long, default_value_t = 64, help = "Framebuffer width in pixels")]
    pub fb_width: u32,
    #[arg(long, default_value_t = 64, help = "Framebuffer height in pixels")]
    pub fb_height: u32,
}

fn parse_u64_maybe_hex(s: &str) -> Result<u64, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid address {:?}: {}", s, e))
}

/// Build the simulator from the TOML configuration, with CLI overrides
/// applied on top.
pub fn make_sim(toml_string: &str, args: &BetatronArgs) -> anyhow::Result<SimTop> {
    let config_table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let mut sim_config = SimConfig::from_section(config_table.get("sim"));
    let mut simt_config = SimtConfig::from_section(config_table.get("simt"));

    simt_config.num_lanes = args.num_lanes.unwrap_or(simt_config.num_lanes);
    simt_config.num_warps = args.num_warps.unwrap_or(simt_config.num_warps);
    sim_config.timeout = args.timeout.unwrap_or(sim_config.timeout);
    if let Some(elf) = &args.elf {
        sim_config.elf = elf.to_string_lossy().into_owned();
    }
    if sim_config.elf.is_empty() {
        return Err(anyhow!("no ELF binary given on the command line or in the config"));
    }

    let image = load_elf(std::path::Path::new(&sim_config.elf))?;
    let mut sim = SimTop::new(&sim_config, Arc::new(simt_config), &image);

    sim.cpu.state.debug = args.cpu_debug;
    sim.cpu.state.regdump = args.regdump && args.cpu_debug;
    sim.gpu.state.regdump = args.regdump;
    sim.shared.quiet = args.stats_only;
    if let Some(input) = &args.input {
        sim.shared.ctrl.set_input(input);
    }

    let trace_path = args
        .trace
        .clone()
        .or_else(|| (!sim_config.trace.is_empty()).then(|| PathBuf::from(&sim_config.trace)));
    if let Some(path) = trace_path {
        let tracer = Tracer::new(&path)
            .with_context(|| format!("cannot create trace file {:?}", path))?;
        sim.shared.coalescer.set_tracer(tracer);
    }

    Ok(sim)
}
