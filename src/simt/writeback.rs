use crate::simt::pipeline::{Latch, PipeState, Shared};
use crate::simt::warp::LaneSet;
use log::debug;

/// Stage 6: writeback / resume. Each cycle drains at most one completion,
/// polled non-blockingly in priority order: multiplier, divider, the normal
/// writeback latch from execute, then memory resume. Completions belonging
/// to the other pipeline are never stolen.
#[derive(Debug, Default)]
pub struct WritebackResume;

impl WritebackResume {
    pub fn execute(
        &mut self,
        input: &mut Latch,
        output: &mut Latch,
        st: &mut PipeState,
        shared: &mut Shared,
    ) {
        let kind = st.kind;

        // 1. multiplier completion
        if shared.mul.peek_completed(kind).is_some() {
            let op = shared.mul.take_completed(kind);
            for (lane, value) in &op.results {
                st.reg_file.write(op.warp.warp_id, *lane, op.rd, *value);
            }
            let warp = &mut st.warps[op.warp.warp_id];
            warp.suspended = false;
            st.inbox.push_back(op.warp.warp_id);
            if st.debug {
                debug!(
                    "[writeback/resume] warp {} completed MUL operation",
                    op.warp.warp_id
                );
            }
            return;
        }

        // 2. divider completion
        if shared.div.peek_completed(kind).is_some() {
            let op = shared.div.take_completed(kind);
            for (lane, value) in &op.results {
                st.reg_file.write(op.warp.warp_id, *lane, op.rd, *value);
            }
            let warp = &mut st.warps[op.warp.warp_id];
            warp.suspended = false;
            st.inbox.push_back(op.warp.warp_id);
            if st.debug {
                debug!(
                    "[writeback/resume] warp {} completed DIV/REM operation",
                    op.warp.warp_id
                );
            }
            return;
        }

        // 3. normal writeback: register writes already happened in execute,
        // the warp just flows through
        if input.updated {
            input.updated = false;
            output.updated = true;
            output.warp = input.warp;
            output.active_lanes = input.active_lanes.clone();
            output.inst = input.inst;

            if st.debug {
                debug!(
                    "[writeback/resume] warp {} values were written back",
                    st.warps[input.warp].warp_id
                );
            }
            if st.regdump {
                st.reg_file.dump(st.warps[input.warp].warp_id);
            }
            return;
        }

        // 4. memory resume
        if let Some(warp_ref) = shared.coalescer.take_resumable(kind) {
            if let Some((rd, results)) = shared.coalescer.take_load_results(warp_ref) {
                for (lane, value) in results {
                    st.reg_file.write(warp_ref.warp_id, lane, rd, value);
                }
            }
            let warp = &mut st.warps[warp_ref.warp_id];
            warp.suspended = false;
            st.inbox.push_back(warp_ref.warp_id);

            output.updated = true;
            output.warp = warp_ref.warp_id;
            output.active_lanes = LaneSet::new();
            output.inst = Default::default();

            if st.debug {
                debug!(
                    "[writeback/resume] warp {} resumed from memory operation",
                    warp_ref.warp_id
                );
            }
            if st.regdump {
                st.reg_file.dump(warp_ref.warp_id);
            }
        }
    }

    /// Active while any of the four sources could produce work for this
    /// pipeline.
    pub fn is_active(&self, input: &Latch, st: &PipeState, shared: &Shared) -> bool {
        input.updated
            || shared.coalescer.is_busy_for(st.kind)
            || shared.mul.is_busy_for(st.kind)
            || shared.div.is_busy_for(st.kind)
    }
}
