use crate::host::control::HostControl;
use crate::mem::coalesce::CoalescingUnit;
use crate::mem::instr::InstructionMemory;
use crate::simt::config::SimtConfig;
use crate::simt::execute::ExecuteSuspend;
use crate::simt::fetch::InstructionFetch;
use crate::simt::fu::{DivUnit, MulUnit};
use crate::simt::isa::DecodedInst;
use crate::simt::operand::{OperandFetch, OperandLatch};
use crate::simt::regfile::{CsrTable, HostRegisterFile, RegisterFile, SimtRegisterFile};
use crate::simt::scheduler::WarpScheduler;
use crate::simt::select::ActiveThreadSelection;
use crate::simt::warp::{LaneSet, PipeKind, Warp};
use crate::simt::writeback::WritebackResume;
use crate::sim::stats::SimStats;
use log::info;
use std::collections::VecDeque;
use std::sync::Arc;

pub const NUM_STAGES: usize = 7;

/// The latch between two pipeline stages: a dirty flag plus the payload a
/// stage hands to the next one. Within one cycle each latch is written at
/// most once.
#[derive(Debug, Default, Clone)]
pub struct Latch {
    pub updated: bool,
    pub warp: usize,
    pub active_lanes: LaneSet,
    pub inst: DecodedInst,
}

/// Units and state shared by the CPU and SIMT pipelines, threaded through
/// every stage explicitly. No hidden globals.
pub struct Shared {
    pub config: Arc<SimtConfig>,
    pub imem: InstructionMemory,
    pub coalescer: CoalescingUnit,
    pub mul: MulUnit,
    pub div: DivUnit,
    pub csrs: CsrTable,
    pub ctrl: HostControl,
    pub stats: SimStats,
    /// Suppress everything except the final statistics.
    pub quiet: bool,
}

impl Shared {
    pub fn new(config: Arc<SimtConfig>, imem: InstructionMemory) -> Self {
        Shared {
            imem,
            coalescer: CoalescingUnit::new(Arc::clone(&config)),
            mul: MulUnit::new(Arc::clone(&config)),
            div: DivUnit::new(Arc::clone(&config)),
            csrs: CsrTable::default(),
            ctrl: HostControl::default(),
            stats: SimStats::default(),
            quiet: false,
            config,
        }
    }
}

/// Mutable per-pipeline state every stage can reach: the warp table (the
/// source of truth for warp state), the re-insertion inbox feeding the
/// scheduler, and the pipeline's register file.
pub struct PipeState {
    pub kind: PipeKind,
    pub warps: Vec<Warp>,
    pub inbox: VecDeque<usize>,
    pub reg_file: Box<dyn RegisterFile>,
    /// True from kernel launch until all warps terminate (SIMT only).
    pub pipeline_active: bool,
    /// Per-pipeline logging gate (the CPU is quiet by default).
    pub debug: bool,
    pub regdump: bool,
}

/// The seven-stage warp-scheduled pipeline. Stages are driven in reverse
/// order each cycle so that each one reads its input latch before the
/// upstream stage overwrites it.
pub struct Pipeline {
    pub state: PipeState,
    latches: [Latch; NUM_STAGES],
    scheduler: WarpScheduler,
    select: ActiveThreadSelection,
    fetch: InstructionFetch,
    operand_fetch: OperandFetch,
    operand_latch: OperandLatch,
    execute: ExecuteSuspend,
    writeback: WritebackResume,
}

impl Pipeline {
    pub fn new_simt(config: Arc<SimtConfig>) -> Self {
        let reg_file = Box::new(SimtRegisterFile::new(Arc::clone(&config)));
        Pipeline::new(PipeKind::Simt, config, reg_file)
    }

    pub fn new_cpu(config: Arc<SimtConfig>, start_pc: u64) -> Self {
        let reg_file = Box::new(HostRegisterFile::new(&config));
        let mut pipeline = Pipeline::new(PipeKind::Cpu, config, reg_file);
        // The CPU is a degenerate 1x1 machine that starts running at reset.
        pipeline
            .state
            .warps
            .push(Warp::new(0, 1, start_pc, PipeKind::Cpu));
        pipeline.scheduler.enqueue_ready(0);
        pipeline
    }

    fn new(kind: PipeKind, config: Arc<SimtConfig>, reg_file: Box<dyn RegisterFile>) -> Self {
        Pipeline {
            state: PipeState {
                kind,
                warps: vec![],
                inbox: VecDeque::new(),
                reg_file,
                pipeline_active: false,
                debug: kind == PipeKind::Simt,
                regdump: false,
            },
            latches: Default::default(),
            scheduler: WarpScheduler::new(config),
            select: ActiveThreadSelection::default(),
            fetch: InstructionFetch::default(),
            operand_fetch: OperandFetch::default(),
            operand_latch: OperandLatch::default(),
            execute: ExecuteSuspend::default(),
            writeback: WritebackResume::default(),
        }
    }

    /// Create the warps for a freshly launched kernel and feed them to the
    /// scheduler. Only meaningful on the SIMT pipeline.
    pub fn launch(&mut self, pc: u64, shared: &Shared) {
        assert_eq!(self.state.kind, PipeKind::Simt, "only the SIMT pipeline launches kernels");
        let config = &shared.config;
        // scheduler availability masks are 64 bits wide
        assert!(config.num_warps <= 64, "at most 64 warps are supported");
        self.state.warps = (0..config.num_warps)
            .map(|wid| Warp::new(wid, config.num_lanes, pc, PipeKind::Simt))
            .collect();
        self.state.inbox.clear();
        self.state.inbox.extend(0..config.num_warps);
        self.state.pipeline_active = true;
        info!("[host control] launched kernel with {} warps at 0x{:08x}", config.num_warps, pc);
    }

    /// One cycle of the whole pipeline, back to front.
    pub fn execute_one_cycle(&mut self, shared: &mut Shared) {
        let st = &mut self.state;

        // stage 6: writeback / resume (input latch 5, output latch 6)
        let (input, output) = latch_pair(&mut self.latches, 5, 6);
        self.writeback.execute(input, output, st, shared);

        // stage 5: execute / suspend
        let (input, output) = latch_pair(&mut self.latches, 4, 5);
        self.execute.execute(input, output, st, shared);

        // stage 4: operand latch
        let (input, output) = latch_pair(&mut self.latches, 3, 4);
        self.operand_latch.execute(input, output, st);

        // stage 3: operand fetch
        let (input, output) = latch_pair(&mut self.latches, 2, 3);
        self.operand_fetch.execute(input, output, st);

        // stage 2: instruction fetch
        let (input, output) = latch_pair(&mut self.latches, 1, 2);
        self.fetch.execute(input, output, st, shared);

        // stage 1: active thread selection
        let (input, output) = latch_pair(&mut self.latches, 0, 1);
        self.select.execute(input, output, st);

        // stage 0: warp scheduler (its "input" latch closes the ring and is
        // never read)
        let (input, output) = latch_pair(&mut self.latches, 6, 0);
        self.scheduler.execute(input, output, st, shared);
    }

    pub fn has_active_stages(&self, shared: &Shared) -> bool {
        // stages 1..=5 are active iff their input latch is dirty
        self.latches[..5].iter().any(|latch| latch.updated)
            || self.scheduler.is_active(&self.state)
            || self.writeback.is_active(&self.latches[5], &self.state, shared)
    }

    pub fn scheduler_active(&self) -> bool {
        self.scheduler.is_active(&self.state)
    }
}

/// Disjoint input/output latch borrows out of the ring.
fn latch_pair(latches: &mut [Latch; NUM_STAGES], input: usize, output: usize) -> (&mut Latch, &mut Latch) {
    assert_ne!(input, output);
    if input < output {
        let (lo, hi) = latches.split_at_mut(output);
        (&mut lo[input], &mut hi[0])
    } else {
        let (lo, hi) = latches.split_at_mut(input);
        (&mut hi[0], &mut lo[output])
    }
}
