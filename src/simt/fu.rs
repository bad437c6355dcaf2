use crate::base::behavior::*;
use crate::base::module::{module, IsModule, ModuleBase};
use crate::simt::config::SimtConfig;
use crate::simt::warp::{LaneSet, PipeKind, WarpRef};
use std::collections::VecDeque;
use std::sync::Arc;

/// A long-latency operation in flight: results are precomputed at issue time
/// (register reads happen at issue, writes at completion) and carried by
/// warp id, never by reference into the warp table.
#[derive(Debug, Clone)]
pub struct FuOp {
    pub warp: WarpRef,
    pub lanes: LaneSet,
    pub rd: u8,
    /// (lane, value) pairs, parallel to `lanes`.
    pub results: Vec<(usize, u32)>,
    pub cycles_left: u64,
}

#[derive(Debug, Default)]
pub struct MulState {
    pipeline: VecDeque<FuOp>,
    done: VecDeque<FuOp>,
}

/// Pipelined multiplier: fixed latency, bounded result queue. `issue`
/// rejects when the result queue is at capacity, which the execute stage
/// turns into a retry.
#[derive(Debug, Default)]
pub struct MulUnit {
    base: ModuleBase<MulState, SimtConfig>,
}

module!(MulUnit, MulState, SimtConfig,);

impl ModuleBehaviors for MulUnit {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
        let cap = self.conf().mul_queue_capacity;
        let state = &mut self.base.state;
        for op in state.pipeline.iter_mut() {
            if op.cycles_left > 0 {
                op.cycles_left -= 1;
            }
        }
        // Completions move to the result queue in original order; a full
        // result queue holds them in the pipeline.
        while state
            .pipeline
            .front()
            .is_some_and(|op| op.cycles_left == 0)
            && state.done.len() < cap
        {
            let op = state.pipeline.pop_front().unwrap();
            state.done.push_back(op);
        }
    }

    fn reset(&mut self) {
        self.base.state.pipeline.clear();
        self.base.state.done.clear();
    }
}

impl MulUnit {
    pub fn new(config: Arc<SimtConfig>) -> Self {
        let mut me = MulUnit::default();
        me.init_conf(config);
        me
    }

    /// Accept a multiply for a whole warp. Rejects when the result queue is
    /// full; precomputed per-lane products travel with the op.
    pub fn issue(&mut self, warp: WarpRef, lanes: LaneSet, rd: u8, results: Vec<(usize, u32)>) -> bool {
        if self.base.state.done.len() >= self.conf().mul_queue_capacity {
            return false;
        }
        let latency = self.conf().mul_latency;
        self.base.state.pipeline.push_back(FuOp {
            warp,
            lanes,
            rd,
            results,
            cycles_left: latency,
        });
        true
    }

    pub fn is_busy_for(&self, kind: PipeKind) -> bool {
        self.base
            .state
            .pipeline
            .iter()
            .chain(self.base.state.done.iter())
            .any(|op| op.warp.kind == kind)
    }

    /// Completion at the head of the result queue, if it belongs to the
    /// given pipeline. The other pipeline's completions are never stolen.
    pub fn peek_completed(&self, kind: PipeKind) -> Option<&FuOp> {
        self.base
            .state
            .done
            .front()
            .filter(|op| op.warp.kind == kind)
    }

    /// Pop the completion previously seen by `peek_completed`.
    pub fn take_completed(&mut self, kind: PipeKind) -> FuOp {
        let op = self
            .base
            .state
            .done
            .pop_front()
            .expect("take_completed without a completed op");
        assert_eq!(op.warp.kind, kind, "completion taken by the wrong pipeline");
        op
    }
}

#[derive(Debug, Default)]
pub struct DivState {
    current: Option<FuOp>,
    done: VecDeque<FuOp>,
}

/// Sequential divider/remainder unit: a single operation in flight; `issue`
/// rejects while occupied.
#[derive(Debug, Default)]
pub struct DivUnit {
    base: ModuleBase<DivState, SimtConfig>,
}

module!(DivUnit, DivState, SimtConfig,);

impl ModuleBehaviors for DivUnit {
    fn tick_one(&mut self) {
        self.base.cycle += 1;
        let state = &mut self.base.state;
        if let Some(op) = state.current.as_mut() {
            if op.cycles_left > 0 {
                op.cycles_left -= 1;
            }
            if op.cycles_left == 0 {
                let op = state.current.take().unwrap();
                state.done.push_back(op);
            }
        }
    }

    fn reset(&mut self) {
        self.base.state.current = None;
        self.base.state.done.clear();
    }
}

impl DivUnit {
    pub fn new(config: Arc<SimtConfig>) -> Self {
        let mut me = DivUnit::default();
        me.init_conf(config);
        me
    }

    pub fn issue(&mut self, warp: WarpRef, lanes: LaneSet, rd: u8, results: Vec<(usize, u32)>) -> bool {
        if self.base.state.current.is_some() {
            return false;
        }
        let latency = self.conf().div_latency;
        self.base.state.current = Some(FuOp {
            warp,
            lanes,
            rd,
            results,
            cycles_left: latency,
        });
        true
    }

    pub fn is_busy_for(&self, kind: PipeKind) -> bool {
        self.base
            .state
            .current
            .iter()
            .chain(self.base.state.done.iter())
            .any(|op| op.warp.kind == kind)
    }

    pub fn peek_completed(&self, kind: PipeKind) -> Option<&FuOp> {
        self.base
            .state
            .done
            .front()
            .filter(|op| op.warp.kind == kind)
    }

    pub fn take_completed(&mut self, kind: PipeKind) -> FuOp {
        let op = self
            .base
            .state
            .done
            .pop_front()
            .expect("take_completed without a completed op");
        assert_eq!(op.warp.kind, kind, "completion taken by the wrong pipeline");
        op
    }
}

/// RV32M division semantics, computed at issue time.
pub fn divide(rs1: u32, rs2: u32, is_signed: bool, get_remainder: bool) -> u32 {
    if is_signed {
        let a = rs1 as i32;
        let b = rs2 as i32;
        if b == 0 {
            if get_remainder { rs1 } else { u32::MAX }
        } else if a == i32::MIN && b == -1 {
            if get_remainder { 0 } else { i32::MIN as u32 }
        } else if get_remainder {
            (a % b) as u32
        } else {
            (a / b) as u32
        }
    } else if rs2 == 0 {
        if get_remainder { rs1 } else { u32::MAX }
    } else if get_remainder {
        rs1 % rs2
    } else {
        rs1 / rs2
    }
}
