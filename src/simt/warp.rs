use smallvec::SmallVec;

/// Which of the two pipelines a warp belongs to. The CPU is modelled as a
/// degenerate one-lane, one-warp pipeline; shared units route completions by
/// this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipeKind {
    Cpu,
    Simt,
}

/// Stable identity of a warp across the shared units. The warp table of the
/// owning pipeline is the source of truth; queues carry this id, never the
/// warp itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WarpRef {
    pub kind: PipeKind,
    pub warp_id: usize,
}

impl WarpRef {
    pub fn is_cpu(&self) -> bool {
        self.kind == PipeKind::Cpu
    }
}

/// Per-warp lane list; bounded by the lane count, which keeps it inline.
pub type LaneSet = SmallVec<[usize; 32]>;

/// A group of lanes executing in lock-step when convergent.
#[derive(Debug, Clone)]
pub struct Warp {
    pub warp_id: usize,
    pub size: usize,
    pub kind: PipeKind,
    /// Per-lane program counter.
    pub pc: Vec<u64>,
    /// Per-lane divergence depth, maintained by the nesting push/pop ops.
    pub nesting_level: Vec<u64>,
    /// Monotonic: once a lane finishes it never runs again.
    pub finished: Vec<bool>,
    /// Set while the lane is stuck in an execute-stage retry loop.
    pub retrying: Vec<bool>,
    /// The warp is out of the ready queue with a memory or long-latency op
    /// in flight.
    pub suspended: bool,
    /// The warp has hit a barrier and waits for its block siblings.
    pub in_barrier: bool,
}

impl Warp {
    pub fn new(warp_id: usize, size: usize, start_pc: u64, kind: PipeKind) -> Self {
        Warp {
            warp_id,
            size,
            kind,
            pc: vec![start_pc; size],
            nesting_level: vec![0; size],
            finished: vec![false; size],
            retrying: vec![false; size],
            suspended: false,
            in_barrier: false,
        }
    }

    pub fn is_cpu(&self) -> bool {
        self.kind == PipeKind::Cpu
    }

    pub fn reference(&self) -> WarpRef {
        WarpRef {
            kind: self.kind,
            warp_id: self.warp_id,
        }
    }

    pub fn all_finished(&self) -> bool {
        self.finished.iter().all(|f| *f)
    }

    /// True if some lane still has work at a fetchable PC.
    pub fn any_runnable(&self, max_pc: u64) -> bool {
        (0..self.size).any(|lane| !self.finished[lane] && self.pc[lane] <= max_pc)
    }
}
