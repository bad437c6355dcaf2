use crate::base::behavior::*;
use crate::base::module::{module, IsModule, ModuleBase};
use crate::simt::config::SimtConfig;
use crate::simt::pipeline::{Latch, PipeState, Shared};
use crate::simt::warp::PipeKind;
use log::debug;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;

/// Isolate the lowest set bit.
fn first_hot(x: u64) -> u64 {
    x & x.wrapping_neg()
}

/// Bounded-time round-robin over a (possibly non-contiguous) availability
/// mask, generalised with a history mask. Returns (new history, chosen bit).
pub fn fair_schedule(hist: u64, avail: u64) -> (u64, u64) {
    let first = first_hot(avail & !hist);
    if first != 0 {
        (hist | first, first)
    } else {
        let second = first_hot(avail);
        (second, second)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ReleaseState {
    #[default]
    Snapshot,
    Check,
    Drain,
}

/// The barrier release unit: a small state machine that scans the in-barrier
/// bit-set one block per pass and releases a block once every warp in it has
/// arrived.
#[derive(Debug, Default)]
struct BarrierReleaseUnit {
    state: ReleaseState,
    shift_reg: u64,
    release_warp_id: usize,
    release_warp_count: u32,
    release_success: bool,
}

impl BarrierReleaseUnit {
    /// One cycle. `barrier_bits` is the freshly rebuilt in-barrier bit-set;
    /// releasing clears `in_barrier` on the warp directly.
    fn step(&mut self, barrier_bits: u64, warps_per_block: u32, num_warps: usize, st: &mut PipeState) {
        // 0 warps per block means every warp forms one block
        let block_width = if warps_per_block == 0 {
            num_warps.min(64) as u32
        } else {
            warps_per_block
        };
        let barrier_mask = if block_width >= 64 {
            u64::MAX
        } else {
            (1u64 << block_width) - 1
        };

        match self.state {
            ReleaseState::Snapshot => {
                self.shift_reg = barrier_bits;
                self.release_warp_id = 0;
                self.state = ReleaseState::Check;
            }
            ReleaseState::Check => {
                // has the head block fully synced?
                self.release_success = (self.shift_reg & barrier_mask) == barrier_mask;
                self.release_warp_count = 0;
                self.state = if self.shift_reg == 0 {
                    ReleaseState::Snapshot
                } else {
                    ReleaseState::Drain
                };
            }
            ReleaseState::Drain => {
                if self.release_success {
                    if let Some(warp) = st.warps.get_mut(self.release_warp_id) {
                        if warp.in_barrier && !warp.is_cpu() {
                            warp.in_barrier = false;
                            debug!("[warp scheduler] barrier released warp {}", warp.warp_id);
                        }
                    }
                }

                self.shift_reg >>= 1;
                self.release_warp_id += 1;
                self.release_warp_count += 1;

                // one whole block per pass, then back to the sync check
                let scanned_all = self.release_warp_id >= 64;
                if self.release_warp_count >= block_width || scanned_all {
                    self.state = if scanned_all || self.shift_reg == 0 {
                        ReleaseState::Snapshot
                    } else {
                        ReleaseState::Check
                    };
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SchedulerState {
    ready: VecDeque<usize>,
    /// Single-slot buffer between the choose and emit substages; models the
    /// two-cycle scheduling latency.
    chosen: Option<usize>,
    history: u64,
    barrier: BarrierReleaseUnit,
}

/// Stage 0: the warp scheduler. Each cycle emits the warp buffered on the
/// previous cycle, then chooses the next one with the fair scheduler.
pub struct WarpScheduler {
    base: ModuleBase<SchedulerState, SimtConfig>,
}

module!(WarpScheduler, SchedulerState, SimtConfig,);

impl ModuleBehaviors for WarpScheduler {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
    }

    fn reset(&mut self) {
        self.base.state.ready.clear();
        self.base.state.chosen = None;
        self.base.state.history = 0;
        self.base.state.barrier = BarrierReleaseUnit::default();
    }
}

impl WarpScheduler {
    pub fn new(config: Arc<SimtConfig>) -> Self {
        let mut me = WarpScheduler {
            base: ModuleBase::default(),
        };
        me.init_conf(config);
        me
    }

    /// Seed the ready queue directly; used for the CPU warp at reset.
    pub fn enqueue_ready(&mut self, warp_id: usize) {
        self.base.state.ready.push_back(warp_id);
    }

    pub fn execute(
        &mut self,
        _input: &mut Latch,
        output: &mut Latch,
        st: &mut PipeState,
        shared: &mut Shared,
    ) {
        self.base.cycle += 1;

        // Second substage: emit the warp chosen on the previous cycle. A
        // stalled selection stage leaves its latch occupied; hold the warp
        // in the buffer until there is room.
        if output.updated {
            // held
        } else if let Some(warp_id) = self.base.state.chosen.take() {
            output.updated = true;
            output.warp = warp_id;
            output.active_lanes = SmallVec::new();
            if st.debug {
                debug!("[warp scheduler] warp {} scheduled to run (substage 2)", warp_id);
            }
        }

        // First substage: refill the ready queue and choose for next cycle.
        while let Some(warp_id) = st.inbox.pop_front() {
            self.base.state.ready.push_back(warp_id);
        }

        // Rebuild the in-barrier bit-set from the live warps and run the
        // barrier release unit over it.
        let mut barrier_bits = 0u64;
        if st.kind == PipeKind::Simt {
            for warp in &st.warps {
                if !warp.finished[0] && warp.in_barrier && warp.warp_id < 64 {
                    barrier_bits |= 1u64 << warp.warp_id;
                }
            }
        }
        let warps_per_block = shared.ctrl.warps_per_block();
        let num_warps = self.conf().num_warps;
        self.base
            .state
            .barrier
            .step(barrier_bits, warps_per_block, num_warps, st);

        // The single-slot buffer is still occupied on a downstream stall.
        if self.base.state.chosen.is_some() || self.base.state.ready.is_empty() {
            return;
        }

        // Availability mask: ready warps that are neither suspended nor in a
        // barrier.
        let mut avail = 0u64;
        for warp_id in &self.base.state.ready {
            let warp = &st.warps[*warp_id];
            if !warp.suspended && !warp.in_barrier && *warp_id < 64 {
                avail |= 1u64 << *warp_id;
            }
        }
        if avail == 0 {
            return;
        }

        let (history, chosen_mask) = fair_schedule(self.base.state.history, avail);
        self.base.state.history = history;
        if chosen_mask == 0 {
            return;
        }
        let chosen_id = chosen_mask.trailing_zeros() as usize;

        // Pull the first matching entry out of the ready queue.
        let position = self
            .base
            .state
            .ready
            .iter()
            .position(|wid| *wid == chosen_id && !st.warps[*wid].suspended);
        if let Some(position) = position {
            self.base.state.ready.remove(position);
            self.base.state.chosen = Some(chosen_id);
            if st.debug {
                debug!(
                    "[warp scheduler] warp {} chosen (substage 1, fair scheduler)",
                    chosen_id
                );
            }
        }
    }

    pub fn is_active(&self, st: &PipeState) -> bool {
        !self.base.state.ready.is_empty()
            || !st.inbox.is_empty()
            || self.base.state.chosen.is_some()
    }
}
