use serde::Serialize;

/// The statistics the SIMT core and the memory system report. Mirrors the
/// counters the reference hardware exposes through its stat CSRs.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SimStats {
    pub gpu_cycles: u64,
    pub gpu_instrs: u64,
    pub gpu_dram_accs: u64,
    pub gpu_retries: u64,
    pub gpu_susps: u64,

    pub cpu_instrs: u64,
    pub cpu_dram_accs: u64,
    /// CPU DRAM accesses made while a kernel was running, tracked separately
    /// so host polling traffic can be subtracted from kernel numbers.
    pub gpu_active_cpu_dram_accs: u64,

    /// Mirror of the SIMT pipeline's active flag, for components that only
    /// see the stats record.
    #[serde(skip)]
    pub gpu_pipeline_active: bool,
}

/// Stat selector values understood by the ask-stats CSR.
pub const STAT_CYCLES: u32 = 0;
pub const STAT_INSTRS: u32 = 1;
pub const STAT_RETRIES: u32 = 5;
pub const STAT_SUSP_BUBBLES: u32 = 6;
pub const STAT_DRAM_ACCESSES: u32 = 9;

impl SimStats {
    pub fn select(&self, selector: u32) -> u64 {
        match selector {
            STAT_CYCLES => self.gpu_cycles,
            STAT_INSTRS => self.gpu_instrs,
            STAT_RETRIES => self.gpu_retries,
            STAT_SUSP_BUBBLES => self.gpu_susps,
            STAT_DRAM_ACCESSES => self.gpu_dram_accs,
            _ => 0,
        }
    }

    pub fn print_human(&self) {
        println!("[Statistics]");
        println!("GPU Cycles: {}", self.gpu_cycles);
        println!("GPU Instrs: {}", self.gpu_instrs);
        println!("CPU Instrs: {}", self.cpu_instrs);
        let ipc = if self.gpu_cycles > 0 {
            self.gpu_instrs as f64 / self.gpu_cycles as f64
        } else {
            0.0
        };
        println!("IPC: {}", ipc);
        println!("GPU DRAMAccs: {}", self.gpu_dram_accs);
        println!("CPU DRAMAccs: {}", self.cpu_dram_accs);
        println!("GPU Retries: {}", self.gpu_retries);
        println!("GPU Susps: {}", self.gpu_susps);
    }

    /// 8-hex-digit fixed-width format, byte-compatible with the reference
    /// hardware's UART stat dump.
    pub fn print_simtight(&self) {
        println!("Cycles: {:08x}", self.gpu_cycles);
        println!("Instrs: {:08x}", self.gpu_instrs);
        println!("Susps: {:08x}", self.gpu_susps);
        println!("Retries: {:08x}", self.gpu_retries);
        println!("DRAMAccs: {:08x}", self.gpu_dram_accs);
    }
}
