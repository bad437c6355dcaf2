use crate::simt::pipeline::{Latch, PipeState};
use crate::simt::warp::LaneSet;
use log::debug;

/// Stage 1: active thread selection. Among the non-finished lanes, the
/// deepest-nesting lanes sharing the PC of the first such lane form the
/// current leaf of the divergence stack and advance together; shallower
/// lanes stay parked until their siblings reconverge.
#[derive(Debug, Default)]
pub struct ActiveThreadSelection;

impl ActiveThreadSelection {
    pub fn execute(&mut self, input: &mut Latch, output: &mut Latch, st: &mut PipeState) {
        if !input.updated {
            return;
        }
        // Downstream has not consumed our previous output: stall, keeping
        // the input latched, so no latch is written twice in one cycle.
        if output.updated {
            return;
        }

        let warp = &st.warps[input.warp];

        let mut max_nesting = 0u64;
        let mut leader_pc = 0u64;
        let mut found_active = false;
        for lane in 0..warp.size {
            if warp.finished[lane] {
                continue;
            }
            if !found_active || warp.nesting_level[lane] > max_nesting {
                max_nesting = warp.nesting_level[lane];
                leader_pc = warp.pc[lane];
                found_active = true;
            }
        }

        input.updated = false;
        output.updated = true;
        output.warp = input.warp;
        output.inst = input.inst;

        if !found_active {
            output.active_lanes = LaneSet::new();
            if st.debug {
                debug!(
                    "[active thread selection] warp {} has 0 active threads (all finished)",
                    warp.warp_id
                );
            }
            return;
        }

        let active_lanes: LaneSet = (0..warp.size)
            .filter(|lane| {
                !warp.finished[*lane]
                    && warp.nesting_level[*lane] == max_nesting
                    && warp.pc[*lane] == leader_pc
            })
            .collect();

        if st.debug {
            debug!(
                "[active thread selection] warp {} has {} active threads",
                warp.warp_id,
                active_lanes.len()
            );
        }
        output.active_lanes = active_lanes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simt::warp::{PipeKind, Warp};
    use std::collections::VecDeque;

    fn state_with_warp(warp: Warp) -> PipeState {
        use crate::simt::config::SimtConfig;
        use crate::simt::regfile::SimtRegisterFile;
        use std::sync::Arc;
        PipeState {
            kind: PipeKind::Simt,
            warps: vec![warp],
            inbox: VecDeque::new(),
            reg_file: Box::new(SimtRegisterFile::new(Arc::new(SimtConfig::default()))),
            pipeline_active: false,
            debug: false,
            regdump: false,
        }
    }

    #[test]
    fn deepest_nesting_lanes_win() {
        let mut warp = Warp::new(0, 4, 0x100, PipeKind::Simt);
        warp.nesting_level = vec![0, 1, 1, 0];
        warp.pc = vec![0x100, 0x200, 0x200, 0x100];
        let mut st = state_with_warp(warp);

        let mut input = Latch {
            updated: true,
            ..Latch::default()
        };
        let mut output = Latch::default();
        ActiveThreadSelection.execute(&mut input, &mut output, &mut st);

        assert!(output.updated);
        assert!(!input.updated);
        assert_eq!(output.active_lanes.as_slice(), &[1, 2]);
    }

    #[test]
    fn equal_nesting_splits_by_pc_of_first_lane() {
        let mut warp = Warp::new(0, 4, 0x100, PipeKind::Simt);
        warp.pc = vec![0x100, 0x180, 0x100, 0x180];
        let mut st = state_with_warp(warp);

        let mut input = Latch {
            updated: true,
            ..Latch::default()
        };
        let mut output = Latch::default();
        ActiveThreadSelection.execute(&mut input, &mut output, &mut st);
        assert_eq!(output.active_lanes.as_slice(), &[0, 2]);
    }

    #[test]
    fn finished_lanes_never_selected() {
        let mut warp = Warp::new(0, 3, 0x100, PipeKind::Simt);
        warp.finished = vec![true, false, true];
        let mut st = state_with_warp(warp);

        let mut input = Latch {
            updated: true,
            ..Latch::default()
        };
        let mut output = Latch::default();
        ActiveThreadSelection.execute(&mut input, &mut output, &mut st);
        assert_eq!(output.active_lanes.as_slice(), &[1]);
    }

    #[test]
    fn all_finished_emits_empty_set() {
        let mut warp = Warp::new(0, 2, 0x100, PipeKind::Simt);
        warp.finished = vec![true, true];
        let mut st = state_with_warp(warp);

        let mut input = Latch {
            updated: true,
            ..Latch::default()
        };
        let mut output = Latch::default();
        ActiveThreadSelection.execute(&mut input, &mut output, &mut st);
        assert!(output.updated);
        assert!(output.active_lanes.is_empty());
    }
}
