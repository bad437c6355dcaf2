use crate::base::behavior::ModuleBehaviors;
use crate::mem::instr::InstructionMemory;
use crate::sim::config::SimConfig;
use crate::sim::elf::ElfImage;
use crate::simt::config::SimtConfig;
use crate::simt::pipeline::{Pipeline, Shared};
use log::warn;
use std::sync::Arc;

/// The whole simulated machine: the CPU pipeline (a 1x1 degenerate core),
/// the SIMT pipeline, and the shared memory system and functional units.
pub struct SimTop {
    pub cpu: Pipeline,
    pub gpu: Pipeline,
    pub shared: Shared,
    pub timeout: u64,
    /// Wall-clock cycles simulated, independent of the kernel cycle counter.
    pub total_cycles: u64,
}

impl SimTop {
    pub fn new(sim_config: &SimConfig, simt_config: Arc<SimtConfig>, image: &ElfImage) -> Self {
        let imem = InstructionMemory::from_image(image);
        let start_pc = imem.base_addr();
        let mut shared = Shared::new(Arc::clone(&simt_config), imem);

        // Initialised globals land in data memory before the first cycle.
        for (addr, bytes) in &image.data_sections {
            shared.coalescer.memory_mut().write_block(*addr, bytes);
        }

        SimTop {
            cpu: Pipeline::new_cpu(Arc::clone(&simt_config), start_pc),
            gpu: Pipeline::new_simt(simt_config),
            shared,
            timeout: sim_config.timeout,
            total_cycles: 0,
        }
    }

    /// One machine cycle: CPU pipeline, then SIMT pipeline, then one step of
    /// the shared units, all in reverse-stage order internally.
    pub fn tick_one(&mut self) {
        self.cpu.execute_one_cycle(&mut self.shared);

        // A launch requested by the CPU this cycle reaches the SIMT
        // scheduler within the same cycle.
        if let Some(pc) = self.shared.ctrl.take_pending_launch() {
            self.gpu.launch(pc, &self.shared);
        }
        self.gpu.execute_one_cycle(&mut self.shared);

        self.shared.coalescer.tick_one();
        self.shared.mul.tick_one();
        self.shared.div.tick_one();

        self.shared
            .ctrl
            .set_sched_active(self.gpu.scheduler_active());

        // The kernel cycle counter runs from launch to last-warp retirement.
        if self.gpu.state.pipeline_active {
            self.shared.stats.gpu_cycles += 1;
            if !self.gpu.has_active_stages(&self.shared) {
                self.gpu.state.pipeline_active = false;
            }
        }
        self.shared.stats.gpu_pipeline_active = self.gpu.state.pipeline_active;

        self.total_cycles += 1;
    }

    pub fn done(&self) -> bool {
        !self.cpu.has_active_stages(&self.shared)
            && !self.gpu.has_active_stages(&self.shared)
            && !self.gpu.state.pipeline_active
    }

    /// Run to completion. Returns false if the timeout fired first.
    pub fn run(&mut self) -> bool {
        while !self.done() {
            if self.total_cycles >= self.timeout {
                warn!(
                    "simulation timed out after {} cycles; aborting",
                    self.total_cycles
                );
                return false;
            }
            self.tick_one();
        }
        true
    }
}
