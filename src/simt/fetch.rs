use crate::simt::decode::DecodeUnit;
use crate::simt::pipeline::{Latch, PipeState, Shared};
use log::{debug, warn};

/// Stage 2: instruction fetch. Reads the 4 bytes at the leading active
/// lane's PC and hands them to the decode oracle.
#[derive(Debug, Default)]
pub struct InstructionFetch;

impl InstructionFetch {
    pub fn execute(
        &mut self,
        input: &mut Latch,
        output: &mut Latch,
        st: &mut PipeState,
        shared: &mut Shared,
    ) {
        if !input.updated {
            return;
        }
        // downstream stall propagates upward
        if output.updated {
            return;
        }

        let warp = &st.warps[input.warp];
        let lane = input.active_lanes.first().copied().unwrap_or(0);
        let pc = warp.pc[lane];

        let Some(raw) = shared.imem.fetch(pc) else {
            warn!(
                "[instruction fetch] warp {} pc 0x{:08x} outside instruction memory",
                warp.warp_id, pc
            );
            input.updated = false;
            output.updated = false;
            return;
        };

        let inst = DecodeUnit::decode(raw);

        input.updated = false;
        output.updated = true;
        output.warp = input.warp;
        output.active_lanes = input.active_lanes.clone();
        output.inst = inst;

        if st.debug {
            debug!(
                "[instruction fetch] warp {} will execute instruction {}",
                warp.warp_id,
                inst.op.mnemonic()
            );
        }
    }
}
