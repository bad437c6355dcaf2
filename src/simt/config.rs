use crate::sim::config::Config;
use serde::Deserialize;

/// Geometry and timing parameters of the simulated machine. Lives in the
/// `[simt]` section of the config TOML; every field has the reference
/// model's default.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimtConfig {
    pub num_lanes: usize,
    pub num_warps: usize,
    pub num_regs: usize,

    /// Pending memory-request FIFO bound; `can_put` fails past this.
    pub mem_queue_capacity: usize,
    /// Coalescing pipeline depth in cycles.
    pub coalesce_depth: u64,
    /// DRAM access latency in cycles.
    pub dram_latency: u64,

    pub mul_latency: u64,
    pub mul_queue_capacity: usize,
    pub div_latency: u64,

    /// The stack window occupies the top `1 << log_bytes_per_stack` bytes of
    /// the 32-bit space per thread; vaddr[31:log_bytes_per_stack] all ones
    /// identifies it.
    pub log_bytes_per_stack: u32,
    /// Warp-id field width in the stack interleaving.
    pub log_warps: u32,

    pub shared_sram_base: u32,
    pub cpu_stack_base: u32,
    pub cpu_initial_sp: u32,
}

impl Config for SimtConfig {}

impl Default for SimtConfig {
    fn default() -> Self {
        Self {
            num_lanes: 32,
            num_warps: 64,
            num_regs: 32,
            mem_queue_capacity: 8,
            coalesce_depth: 4,
            dram_latency: 20,
            mul_latency: 3,
            mul_queue_capacity: 4,
            div_latency: 32,
            log_bytes_per_stack: 19,
            log_warps: 6,
            shared_sram_base: 0xFF80_0000,
            cpu_stack_base: 0xF000_0000,
            cpu_initial_sp: 0xFFFF_FFF8,
        }
    }
}

impl SimtConfig {
    pub fn log_lanes(&self) -> u32 {
        assert!(self.num_lanes.is_power_of_two(), "num_lanes must be 2^n");
        self.num_lanes.trailing_zeros()
    }

    /// Base of the per-thread stack window (0xFFF8_0000 with the defaults).
    pub fn stack_base(&self) -> u32 {
        !0u32 << self.log_bytes_per_stack
    }

    /// Is this 32-bit address in the shared-SRAM window, which is served
    /// on-chip and never counted as a DRAM access?
    pub fn in_shared_sram(&self, addr32: u32) -> bool {
        self.shared_sram_base <= addr32 && addr32 < self.stack_base()
    }
}
