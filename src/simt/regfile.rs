use crate::simt::config::SimtConfig;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

/// Integer register state as seen by one pipeline. The SIMT pipeline keeps a
/// dense per-warp, per-lane table; the CPU pipeline keeps a single lane's
/// worth of state. Register index 0 reads as 0 and ignores writes.
pub trait RegisterFile {
    fn read(&mut self, warp_id: usize, lane: usize, reg: u8) -> u32;
    fn write(&mut self, warp_id: usize, lane: usize, reg: u8, value: u32);
    fn dump(&self, warp_id: usize);
}

/// Dense per-warp register table, lazily allocated the first time a warp
/// touches it. Layout: `registers[warp_id][reg_index][lane]`.
pub struct SimtRegisterFile {
    config: Arc<SimtConfig>,
    warps: HashMap<usize, Vec<Vec<u32>>>,
}

impl SimtRegisterFile {
    pub fn new(config: Arc<SimtConfig>) -> Self {
        SimtRegisterFile {
            config,
            warps: HashMap::new(),
        }
    }

    fn ensure_warp(&mut self, warp_id: usize) -> &mut Vec<Vec<u32>> {
        let num_regs = self.config.num_regs;
        let num_lanes = self.config.num_lanes;
        self.warps
            .entry(warp_id)
            .or_insert_with(|| vec![vec![0u32; num_lanes]; num_regs])
    }
}

impl RegisterFile for SimtRegisterFile {
    fn read(&mut self, warp_id: usize, lane: usize, reg: u8) -> u32 {
        if reg == 0 {
            return 0;
        }
        self.ensure_warp(warp_id)[reg as usize][lane]
    }

    fn write(&mut self, warp_id: usize, lane: usize, reg: u8, value: u32) {
        let num_regs = self.config.num_regs;
        let num_lanes = self.config.num_lanes;
        if reg == 0 {
            return;
        }
        if (reg as usize) >= num_regs || lane >= num_lanes {
            warn!("[register file] dropping out-of-range write x{} lane {}", reg, lane);
            return;
        }
        self.ensure_warp(warp_id)[reg as usize][lane] = value;
    }

    fn dump(&self, warp_id: usize) {
        let Some(regs) = self.warps.get(&warp_id) else {
            println!("no registers for warp {}", warp_id);
            return;
        };
        let lanes = regs.first().map(Vec::len).unwrap_or(0);
        print!("{:>4}", "Lane");
        for lane in 0..lanes {
            print!("{:>9}", lane);
        }
        println!();
        for (idx, row) in regs.iter().enumerate() {
            print!("{:>4}", format!("x{}", idx));
            for value in row {
                print!(" {:08x}", value);
            }
            println!();
        }
    }
}

/// The CPU view of register state: one lane, one warp. Warp and lane ids are
/// accepted and ignored so the two pipelines share the execute-stage code.
pub struct HostRegisterFile {
    regs: Vec<u32>,
}

impl HostRegisterFile {
    pub fn new(config: &SimtConfig) -> Self {
        let mut regs = vec![0u32; config.num_regs];
        // x2 starts at the top of the (virtual) stack window
        regs[2] = config.cpu_initial_sp;
        HostRegisterFile { regs }
    }
}

impl RegisterFile for HostRegisterFile {
    fn read(&mut self, _warp_id: usize, _lane: usize, reg: u8) -> u32 {
        if reg == 0 {
            return 0;
        }
        self.regs.get(reg as usize).copied().unwrap_or(0)
    }

    fn write(&mut self, _warp_id: usize, _lane: usize, reg: u8, value: u32) {
        if reg == 0 {
            return;
        }
        if let Some(slot) = self.regs.get_mut(reg as usize) {
            *slot = value;
        }
    }

    fn dump(&self, _warp_id: usize) {
        println!("{:>4}", "Host");
        for (idx, value) in self.regs.iter().enumerate() {
            println!("{:>4} {:08x}", format!("x{}", idx), value);
        }
    }
}

/// Persistent per-(warp, lane) CSR state, shared between the two pipelines
/// the way the hardware shares its CSR file (the CPU forwards to it).
#[derive(Debug, Default)]
pub struct CsrTable {
    csrs: HashMap<(usize, usize), HashMap<u16, u32>>,
}

impl CsrTable {
    pub fn get(&self, warp_id: usize, lane: usize, addr: u16) -> Option<u32> {
        self.csrs
            .get(&(warp_id, lane))
            .and_then(|m| m.get(&addr))
            .copied()
    }

    pub fn set(&mut self, warp_id: usize, lane: usize, addr: u16, value: u32) {
        self.csrs
            .entry((warp_id, lane))
            .or_default()
            .insert(addr, value);
    }
}
