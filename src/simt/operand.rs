use crate::simt::pipeline::{Latch, PipeState};
use log::debug;

/// Stage 3: operand fetch. Models the register-file read issue; operand
/// values are actually resolved in execute, which is equivalent because only
/// one instruction per warp is ever in flight.
#[derive(Debug, Default)]
pub struct OperandFetch;

impl OperandFetch {
    pub fn execute(&mut self, input: &mut Latch, output: &mut Latch, st: &mut PipeState) {
        if !input.updated {
            return;
        }
        // downstream stall propagates upward
        if output.updated {
            return;
        }

        input.updated = false;
        output.updated = true;
        output.warp = input.warp;
        output.active_lanes = input.active_lanes.clone();
        output.inst = input.inst;

        if st.debug {
            debug!(
                "[operand fetch] warp {} using operands of {}",
                st.warps[input.warp].warp_id, input.inst
            );
        }
    }
}

/// Stage 4: operand latch. Accounts for the register-file load latency and
/// provides the pipeline boundary in front of execute.
#[derive(Debug, Default)]
pub struct OperandLatch;

impl OperandLatch {
    pub fn execute(&mut self, input: &mut Latch, output: &mut Latch, st: &mut PipeState) {
        if !input.updated {
            return;
        }
        // execute holds its input latch across retries; do not overwrite it
        if output.updated {
            return;
        }

        input.updated = false;
        output.updated = true;
        output.warp = input.warp;
        output.active_lanes = input.active_lanes.clone();
        output.inst = input.inst;

        if st.debug {
            debug!(
                "[operand latch] warp {} operands latched",
                st.warps[input.warp].warp_id
            );
        }
    }
}
