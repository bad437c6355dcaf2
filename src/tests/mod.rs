pub mod asm;
mod machine_tests;

use crate::sim::config::SimConfig;
use crate::sim::elf::ElfImage;
use crate::sim::top::SimTop;
use crate::simt::config::SimtConfig;
use std::sync::Arc;

/// Build a machine around a raw instruction image, host code first.
pub fn build_sim(base: u64, words: &[u32], simt: SimtConfig) -> SimTop {
    let text: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let image = ElfImage {
        entry: base,
        text_base: base,
        text,
        data_sections: vec![],
    };
    let sim_config = SimConfig {
        timeout: 2_000_000,
        ..SimConfig::default()
    };
    let mut sim = SimTop::new(&sim_config, Arc::new(simt), &image);
    sim.shared.quiet = true;
    sim
}

/// Run to completion; panics if the machine hangs.
pub fn run_to_completion(sim: &mut SimTop) {
    assert!(sim.run(), "simulation did not terminate before the timeout");
}
