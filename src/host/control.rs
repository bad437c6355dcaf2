use log::info;
use std::collections::VecDeque;

/// Host-side kernel control. The CPU drives this through CSR writes; the
/// SIMT pipeline drains the launch request at the top of its cycle and
/// mirrors its scheduler-active status back so the CPU can poll it.
#[derive(Debug, Default)]
pub struct HostControl {
    kernel_pc: u64,
    arg_ptr: u64,
    warps_per_block: u32,
    /// Set on launch; cleared only when a fresh launch supersedes it. The
    /// "GPU busy" the CPU observes is this AND the scheduler having work.
    gpu_active: bool,
    sched_active: bool,
    pending_launch: Option<u64>,
    uart: String,
    stat_value: u32,
    input: VecDeque<u8>,
}

impl HostControl {
    /// Seed the simulated input stream read through the sim-input CSR.
    pub fn set_input(&mut self, input: &str) {
        self.input = input.bytes().collect();
    }

    /// Next byte of simulated input, or -1 at end of stream.
    pub fn next_input_byte(&mut self) -> i32 {
        self.input.pop_front().map(|b| b as i32).unwrap_or(-1)
    }

    pub fn set_pc(&mut self, pc: u64) {
        self.kernel_pc = pc;
    }

    pub fn set_arg_ptr(&mut self, ptr: u64) {
        self.arg_ptr = ptr;
    }

    pub fn arg_ptr(&self) -> u64 {
        self.arg_ptr
    }

    pub fn set_warps_per_block(&mut self, n: u32) {
        info!(
            "[host control] set warps per block to {}{}",
            n,
            if n == 0 { " (all warps)" } else { "" }
        );
        self.warps_per_block = n;
    }

    pub fn warps_per_block(&self) -> u32 {
        self.warps_per_block
    }

    /// Request a kernel launch at the previously-written PC. The SIMT
    /// pipeline picks this up at its next cycle boundary.
    pub fn launch_kernel(&mut self) {
        self.pending_launch = Some(self.kernel_pc);
        self.gpu_active = true;
    }

    pub fn take_pending_launch(&mut self) -> Option<u64> {
        self.pending_launch.take()
    }

    /// Mirror of the SIMT scheduler's is_active, refreshed once per cycle.
    pub fn set_sched_active(&mut self, active: bool) {
        self.sched_active = active;
    }

    pub fn is_gpu_active(&self) -> bool {
        self.gpu_active && (self.pending_launch.is_some() || self.sched_active)
    }

    pub fn buffer_byte(&mut self, byte: u8) {
        if byte == 0 {
            return;
        }
        self.uart.push(byte as char);
    }

    pub fn uart_output(&self) -> &str {
        &self.uart
    }

    pub fn set_stat_value(&mut self, value: u32) {
        self.stat_value = value;
    }

    pub fn stat_value(&self) -> u32 {
        self.stat_value
    }
}
