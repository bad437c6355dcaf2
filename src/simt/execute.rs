use crate::host::control::HostControl;
use crate::mem::coalesce::{CoalescingUnit, MemOp, MemRequest};
use crate::sim::stats::SimStats;
use crate::simt::config::SimtConfig;
use crate::simt::fu::{divide, DivUnit, MulUnit};
use crate::simt::isa::{DecodedInst, Opcode};
use crate::simt::pipeline::{Latch, PipeState, Shared};
use crate::simt::regfile::{CsrTable, RegisterFile};
use crate::simt::warp::{PipeKind, Warp};
use log::{debug, warn};

/// Outcome of executing one instruction for a warp.
///
/// `success` false means retry: the instruction could not issue (full queue
/// or busy unit) and no lane's PC moved. `counted` false keeps it out of the
/// retired-instruction statistics. `write_required` makes the writeback
/// latch fire this cycle; memory and long-latency ops defer writeback to the
/// resume path instead.
#[derive(Debug, Clone, Copy)]
pub struct ExecResult {
    pub success: bool,
    pub write_required: bool,
    pub counted: bool,
}

impl Default for ExecResult {
    fn default() -> Self {
        ExecResult {
            success: true,
            write_required: false,
            counted: true,
        }
    }
}

/// Everything instruction semantics can touch, borrowed for one dispatch.
struct ExecCtx<'a> {
    warp: &'a mut Warp,
    lanes: &'a [usize],
    rf: &'a mut dyn RegisterFile,
    coalescer: &'a mut CoalescingUnit,
    mul: &'a mut MulUnit,
    div: &'a mut DivUnit,
    csrs: &'a mut CsrTable,
    ctrl: &'a mut HostControl,
    stats: &'a mut SimStats,
    config: &'a SimtConfig,
    quiet: bool,
}

impl<'a> ExecCtx<'a> {
    fn read(&mut self, lane: usize, reg: u8) -> u32 {
        self.rf.read(self.warp.warp_id, lane, reg)
    }

    fn write(&mut self, lane: usize, reg: u8, value: u32) {
        self.rf.write(self.warp.warp_id, lane, reg, value);
    }

    fn advance(&mut self, lane: usize) {
        self.warp.pc[lane] += 4;
    }

    /// Register-register ALU op; returns whether a writeback is due.
    fn alu_rr(&mut self, inst: &DecodedInst, f: impl Fn(u32, u32) -> u32) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            let rs2 = self.read(lane, inst.rs2);
            self.write(lane, inst.rd, f(rs1, rs2));
            self.advance(lane);
        }
        !self.lanes.is_empty()
    }

    /// Register-immediate ALU op.
    fn alu_ri(&mut self, inst: &DecodedInst, f: impl Fn(u32, i32) -> u32) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            self.write(lane, inst.rd, f(rs1, inst.imm));
            self.advance(lane);
        }
        !self.lanes.is_empty()
    }

    /// Conditional branch: taken lanes jump by the byte displacement.
    fn branch(&mut self, inst: &DecodedInst, taken: impl Fn(u32, u32) -> bool) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            let rs2 = self.read(lane, inst.rs2);
            if taken(rs1, rs2) {
                self.warp.pc[lane] = self.warp.pc[lane].wrapping_add(inst.imm as i64 as u64);
            } else {
                self.advance(lane);
            }
        }
        !self.lanes.is_empty()
    }

    fn lui(&mut self, inst: &DecodedInst) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            self.write(lane, inst.rd, (inst.imm as u32) << 12);
            self.advance(lane);
        }
        !self.lanes.is_empty()
    }

    fn auipc(&mut self, inst: &DecodedInst) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let value = (self.warp.pc[lane] as u32).wrapping_add((inst.imm as u32) << 12);
            self.write(lane, inst.rd, value);
            self.advance(lane);
        }
        !self.lanes.is_empty()
    }

    fn jal(&mut self, inst: &DecodedInst) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let link = (self.warp.pc[lane] + 4) as u32;
            self.write(lane, inst.rd, link);
            self.warp.pc[lane] = self.warp.pc[lane].wrapping_add(inst.imm as i64 as u64);
        }
        !self.lanes.is_empty()
    }

    /// Jump-and-link-register; a jump to address 0 finishes the lane.
    fn jalr(&mut self, inst: &DecodedInst) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            let link = (self.warp.pc[lane] + 4) as u32;
            self.write(lane, inst.rd, link);
            let target = (rs1 as u64).wrapping_add(inst.imm as i64 as u64) & !1u64;
            if target == 0 {
                self.warp.finished[lane] = true;
            } else {
                self.warp.pc[lane] = target;
            }
        }
        !self.lanes.is_empty()
    }

    /// Effective address: registers hold 32-bit values, zero-extended before
    /// the sign-extended displacement is applied.
    fn effective_addr(&mut self, lane: usize, base: u8, disp: i32) -> u64 {
        (self.read(lane, base) as u64).wrapping_add(disp as i64 as u64)
    }

    fn leader_pc(&self) -> u64 {
        self.lanes
            .first()
            .map(|lane| self.warp.pc[*lane])
            .unwrap_or(0)
    }

    /// Loads of 1/2/4 bytes. Queues a request and suspends the warp; the
    /// destination register is written on resume. Returns false with no PC
    /// movement when the memory queue is full.
    fn load(&mut self, inst: &DecodedInst, bytes: usize, zero_extend: bool) -> bool {
        if !self.coalescer.can_put() {
            return false;
        }

        let mut addrs = Vec::with_capacity(self.lanes.len());
        for i in 0..self.lanes.len() {
            addrs.push(self.effective_addr(self.lanes[i], inst.rs1, inst.imm));
        }

        let req = MemRequest {
            warp: self.warp.reference(),
            op: MemOp::Load { zero_extend },
            addrs,
            bytes,
            rd: inst.rd,
            values: vec![],
            lanes: self.lanes.to_vec(),
            pc: self.leader_pc(),
        };
        self.coalescer.put(req, self.stats);
        self.warp.suspended = true;

        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn store(&mut self, inst: &DecodedInst, bytes: usize) -> bool {
        if !self.coalescer.can_put() {
            return false;
        }

        let mut addrs = Vec::with_capacity(self.lanes.len());
        let mut values = Vec::with_capacity(self.lanes.len());
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            values.push(self.read(lane, inst.rs2));
            addrs.push(self.effective_addr(lane, inst.rs1, inst.imm));
        }

        let req = MemRequest {
            warp: self.warp.reference(),
            op: MemOp::Store,
            addrs,
            bytes,
            rd: 0,
            values,
            lanes: self.lanes.to_vec(),
            pc: self.leader_pc(),
        };
        self.coalescer.put(req, self.stats);
        self.warp.suspended = true;

        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    /// Atomic fetch-and-add on a word. The pre-operation memory value lands
    /// in rd on resume.
    fn amoadd(&mut self, inst: &DecodedInst) -> bool {
        if !self.coalescer.can_put() {
            return false;
        }

        let mut addrs = Vec::with_capacity(self.lanes.len());
        let mut addends = Vec::with_capacity(self.lanes.len());
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            addends.push(self.read(lane, inst.rs2));
            addrs.push(self.effective_addr(lane, inst.rs1, 0));
        }

        let req = MemRequest {
            warp: self.warp.reference(),
            op: MemOp::AmoAdd,
            addrs,
            bytes: 4,
            rd: inst.rd,
            values: addends,
            lanes: self.lanes.to_vec(),
            pc: self.leader_pc(),
        };
        self.coalescer.put(req, self.stats);
        self.warp.suspended = true;

        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn fence(&mut self) -> bool {
        if !self.coalescer.can_put() {
            return false;
        }
        self.coalescer
            .put(MemRequest::fence(self.warp.reference()), self.stats);
        self.warp.suspended = true;
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn mul_issue(&mut self, inst: &DecodedInst) -> bool {
        let mut products = Vec::with_capacity(self.lanes.len());
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            let rs2 = self.read(lane, inst.rs2);
            products.push((lane, rs1.wrapping_mul(rs2)));
        }
        if !self.mul.issue(
            self.warp.reference(),
            self.lanes.iter().copied().collect(),
            inst.rd,
            products,
        ) {
            return false;
        }
        self.warp.suspended = true;
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn div_issue(&mut self, inst: &DecodedInst, is_signed: bool, get_remainder: bool) -> bool {
        let mut quotients = Vec::with_capacity(self.lanes.len());
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1 = self.read(lane, inst.rs1);
            let rs2 = self.read(lane, inst.rs2);
            quotients.push((lane, divide(rs1, rs2, is_signed, get_remainder)));
        }
        if !self.div.issue(
            self.warp.reference(),
            self.lanes.iter().copied().collect(),
            inst.rd,
            quotients,
        ) {
            return false;
        }
        self.warp.suspended = true;
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    /// Divergence entry: deepen every active lane.
    fn nocl_push(&mut self) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            self.warp.nesting_level[lane] += 1;
            self.advance(lane);
        }
        false
    }

    /// Reconvergence: every non-finished lane at depth >= 1 pops, not just
    /// the active set, so parked siblings advance and the warp reconverges
    /// on the next cycle.
    fn nocl_pop(&mut self) -> bool {
        for lane in 0..self.warp.size {
            if !self.warp.finished[lane] && self.warp.nesting_level[lane] >= 1 {
                self.warp.nesting_level[lane] -= 1;
                self.advance(lane);
            }
        }
        false
    }

    fn cache_line_flush(&mut self) -> bool {
        // no cache in the reference timing model; just advance
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn ecall(&mut self) -> bool {
        debug!("[execute/suspend] received an ecall");
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn ebreak(&mut self) -> bool {
        debug!("[execute/suspend] received an ebreak");
        for i in 0..self.lanes.len() {
            self.advance(self.lanes[i]);
        }
        false
    }

    fn csrrw(&mut self, inst: &DecodedInst) -> bool {
        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let rs1_val = self.read(lane, inst.rs1);
            let handled = self.csr_access(inst, lane, rs1_val);
            if handled {
                self.advance(lane);
                continue;
            }

            // Fall back to the persistent CSR table.
            let Some(old) = self.csrs.get(self.warp.warp_id, lane, inst.csr) else {
                warn!(
                    "[csrrw] control/status register 0x{:x} is undefined for warp {} lane {}, skipping",
                    inst.csr, self.warp.warp_id, lane
                );
                continue;
            };
            self.write(lane, inst.rd, old);
            self.csrs.set(self.warp.warp_id, lane, inst.csr, rs1_val);
            self.advance(lane);
        }
        false
    }

    /// The memory-mapped CSR space: UART, host/GPU handshake, statistics,
    /// barrier/terminate, cycle counter. Returns false for addresses not
    /// handled here.
    fn csr_access(&mut self, inst: &DecodedInst, lane: usize, rs1_val: u32) -> bool {
        match inst.csr {
            0x800 => {
                // SimEmit: print the written word
                if !self.quiet {
                    println!("[SimEmit] 0x{:x}", rs1_val);
                }
                self.write(lane, inst.rd, 0);
            }
            0x801 => {
                // SimFinish
                if !self.quiet {
                    println!("[SimFinish] terminating simulator");
                }
                self.write(lane, inst.rd, 0);
            }
            0x802 | 0x804 => {
                // always-ready handshakes
                self.write(lane, inst.rd, 1);
            }
            0x803 => {
                // UART byte out; write-only, reads return 0
                self.ctrl.buffer_byte(rs1_val as u8);
                self.write(lane, inst.rd, 0);
            }
            0x805 => {
                let byte = self.ctrl.next_input_byte();
                self.write(lane, inst.rd, byte as u32);
            }
            0x806 | 0x807 | 0x821 | 0x822 => {
                // instruction-memory write protocol: accepted, ignored
                self.write(lane, inst.rd, 0);
            }
            0x820 => {
                // may the CPU issue a launch?
                let can_launch = !self.ctrl.is_gpu_active();
                self.write(lane, inst.rd, can_launch as u32);
            }
            0x823 => {
                // writing a nonzero kernel entry PC launches the kernel
                if rs1_val != 0 {
                    self.ctrl.set_pc(rs1_val as u64);
                    self.ctrl.launch_kernel();
                }
                self.write(lane, inst.rd, 0);
            }
            0x824 => {
                // kernel completion poll
                let done = !self.ctrl.is_gpu_active();
                self.write(lane, inst.rd, done as u32);
            }
            0x825 => {
                // response slot of the ask-stats protocol
                let value = self.ctrl.stat_value();
                self.write(lane, inst.rd, value);
            }
            0x826 => {
                self.ctrl.set_arg_ptr(rs1_val as u64);
            }
            0x827 => {
                self.ctrl.set_warps_per_block(rs1_val);
                self.write(lane, inst.rd, 0);
            }
            0x828 => {
                // stat request: the response is read back through 0x825
                let value = self.stats.select(rs1_val);
                self.ctrl.set_stat_value(value as u32);
                self.write(lane, inst.rd, 0);
            }
            0x830 => return self.barrier_csr(inst, lane, rs1_val),
            0x831 => {
                self.write(lane, inst.rd, self.ctrl.arg_ptr() as u32);
            }
            0xC00 => {
                self.write(lane, inst.rd, self.stats.gpu_cycles as u32);
            }
            0xC80 => {
                self.write(lane, inst.rd, (self.stats.gpu_cycles >> 32) as u32);
            }
            0xF14 => {
                // hart id = (warp_id << log2(lanes)) | lane_id
                let hart =
                    ((self.warp.warp_id as u32) << self.config.log_lanes()) | lane as u32;
                self.write(lane, inst.rd, hart);
            }
            _ => return false,
        }
        true
    }

    /// The barrier/terminate CSR: writing 0 parks the warp in a barrier,
    /// writing nonzero finishes every lane.
    fn barrier_csr(&mut self, inst: &DecodedInst, lane: usize, rs1_val: u32) -> bool {
        let old = self.csrs.get(self.warp.warp_id, lane, 0x830).unwrap_or(0);
        self.write(lane, inst.rd, old);

        if rs1_val != 0 || inst.rd == 0 {
            self.csrs.set(self.warp.warp_id, lane, 0x830, rs1_val);
            if rs1_val == 0 {
                // a warp must be converged when it enters a barrier; a
                // diverged entry means an upstream pop failed to reconverge
                let mut leader: Option<(u64, u64)> = None;
                let mut converged = true;
                for l in 0..self.warp.size {
                    if self.warp.finished[l] {
                        continue;
                    }
                    match leader {
                        None => leader = Some((self.warp.pc[l], self.warp.nesting_level[l])),
                        Some((pc, nest)) => {
                            if self.warp.pc[l] != pc || self.warp.nesting_level[l] != nest {
                                converged = false;
                                break;
                            }
                        }
                    }
                }
                if !converged && leader.is_some() {
                    warn!(
                        "[csrrw] barrier entered by diverged warp {} (PCs/nesting levels differ)",
                        self.warp.warp_id
                    );
                }
                self.warp.in_barrier = true;
            } else {
                for l in 0..self.warp.size {
                    self.warp.finished[l] = true;
                }
            }
        }
        true
    }
}

/// Dispatch one instruction for the active lanes of a warp.
fn dispatch(ctx: &mut ExecCtx, inst: &DecodedInst) -> ExecResult {
    let mut res = ExecResult::default();

    res.write_required = match inst.op {
        Opcode::Add => ctx.alu_rr(inst, |a, b| a.wrapping_add(b)),
        Opcode::Sub => ctx.alu_rr(inst, |a, b| a.wrapping_sub(b)),
        Opcode::And => ctx.alu_rr(inst, |a, b| a & b),
        Opcode::Or => ctx.alu_rr(inst, |a, b| a | b),
        Opcode::Xor => ctx.alu_rr(inst, |a, b| a ^ b),
        // shift amounts are masked to 5 bits
        Opcode::Sll => ctx.alu_rr(inst, |a, b| a << (b & 0x1F)),
        Opcode::Srl => ctx.alu_rr(inst, |a, b| a >> (b & 0x1F)),
        Opcode::Sra => ctx.alu_rr(inst, |a, b| ((a as i32) >> (b & 0x1F)) as u32),
        Opcode::Slt => ctx.alu_rr(inst, |a, b| ((a as i32) < (b as i32)) as u32),
        Opcode::Sltu => ctx.alu_rr(inst, |a, b| (a < b) as u32),

        Opcode::Addi => ctx.alu_ri(inst, |a, imm| a.wrapping_add(imm as u32)),
        Opcode::Andi => ctx.alu_ri(inst, |a, imm| a & imm as u32),
        Opcode::Ori => ctx.alu_ri(inst, |a, imm| a | imm as u32),
        Opcode::Xori => ctx.alu_ri(inst, |a, imm| a ^ imm as u32),
        Opcode::Slli => ctx.alu_ri(inst, |a, imm| a << (imm as u32 & 0x1F)),
        Opcode::Srli => ctx.alu_ri(inst, |a, imm| a >> (imm as u32 & 0x1F)),
        Opcode::Srai => ctx.alu_ri(inst, |a, imm| ((a as i32) >> (imm as u32 & 0x1F)) as u32),
        Opcode::Slti => ctx.alu_ri(inst, |a, imm| ((a as i32) < imm) as u32),
        Opcode::Sltiu => ctx.alu_ri(inst, |a, imm| (a < imm as u32) as u32),

        Opcode::Lui => ctx.lui(inst),
        Opcode::Auipc => ctx.auipc(inst),
        Opcode::Jal => ctx.jal(inst),
        Opcode::Jalr => ctx.jalr(inst),

        Opcode::Beq => ctx.branch(inst, |a, b| a == b),
        Opcode::Bne => ctx.branch(inst, |a, b| a != b),
        Opcode::Blt => ctx.branch(inst, |a, b| (a as i32) < (b as i32)),
        Opcode::Bge => ctx.branch(inst, |a, b| (a as i32) >= (b as i32)),
        Opcode::Bltu => ctx.branch(inst, |a, b| a < b),
        Opcode::Bgeu => ctx.branch(inst, |a, b| a >= b),

        Opcode::Lw => ctx.load(inst, 4, false),
        Opcode::Lh => ctx.load(inst, 2, false),
        Opcode::Lhu => ctx.load(inst, 2, true),
        Opcode::Lb => ctx.load(inst, 1, false),
        Opcode::Lbu => ctx.load(inst, 1, true),
        Opcode::Sw => ctx.store(inst, 4),
        Opcode::Sh => ctx.store(inst, 2),
        Opcode::Sb => ctx.store(inst, 1),
        Opcode::AmoaddW => ctx.amoadd(inst),
        Opcode::Fence => ctx.fence(),

        Opcode::Mul => ctx.mul_issue(inst),
        Opcode::Div => ctx.div_issue(inst, true, false),
        Opcode::Divu => ctx.div_issue(inst, false, false),
        Opcode::Rem => ctx.div_issue(inst, true, true),
        Opcode::Remu => ctx.div_issue(inst, false, true),

        Opcode::Ecall => ctx.ecall(),
        Opcode::Ebreak => ctx.ebreak(),
        Opcode::Csrrw => ctx.csrrw(inst),
        Opcode::NoclPush => ctx.nocl_push(),
        Opcode::NoclPop => ctx.nocl_pop(),
        Opcode::CacheLineFlush => ctx.cache_line_flush(),

        Opcode::Unknown => {
            warn!("[execute/suspend] unknown instruction 0x{:08x}, skipping", inst.raw);
            for i in 0..ctx.lanes.len() {
                ctx.advance(ctx.lanes[i]);
            }
            res.counted = false;
            false
        }
    };

    // A structural hazard leaves the warp unsuspended with no writeback due:
    // retry with every PC unchanged.
    if matches!(
        inst.op,
        Opcode::Lw
            | Opcode::Lh
            | Opcode::Lhu
            | Opcode::Lb
            | Opcode::Lbu
            | Opcode::Sw
            | Opcode::Sh
            | Opcode::Sb
            | Opcode::AmoaddW
            | Opcode::Fence
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Divu
            | Opcode::Rem
            | Opcode::Remu
    ) && !res.write_required
        && !ctx.warp.suspended
    {
        res.success = false;
        res.counted = false;
    }

    res
}

/// Stage 5: execute / suspend. Performs the per-lane instruction semantics,
/// charges statistics, holds retrying warps in place, and re-inserts
/// non-suspended warps into the scheduler's inbox.
#[derive(Debug, Default)]
pub struct ExecuteSuspend;

impl ExecuteSuspend {
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
        // Writeback is still holding our previous result; executing now
        // could require a second write into the occupied latch.
        if output.updated {
            return;
        }

        let is_simt = st.kind == PipeKind::Simt;
        let warp = &mut st.warps[input.warp];
        let lanes = input.active_lanes.clone();
        let inst = input.inst;

        // A still-suspended warp reaching execute is a wasted slot the
        // scheduler created; count the bubble.
        if warp.suspended && is_simt {
            shared.stats.gpu_susps += 1;
        }

        let result = {
            let mut ctx = ExecCtx {
                warp: &mut *warp,
                lanes: &lanes,
                rf: st.reg_file.as_mut(),
                coalescer: &mut shared.coalescer,
                mul: &mut shared.mul,
                div: &mut shared.div,
                csrs: &mut shared.csrs,
                ctrl: &mut shared.ctrl,
                stats: &mut shared.stats,
                config: shared.config.as_ref(),
                quiet: shared.quiet,
            };
            dispatch(&mut ctx, &inst)
        };

        // Retry accounting runs against the previous cycle's flags so the
        // counter moves exactly once per retry cycle.
        let was_retrying = lanes.iter().any(|lane| warp.retrying[*lane]);
        if was_retrying && is_simt {
            shared.stats.gpu_retries += 1;
        }

        if !result.success && !warp.suspended && is_simt {
            if !was_retrying {
                shared.stats.gpu_retries += 1;
            }
            for lane in &lanes {
                warp.retrying[*lane] = true;
            }
            // The warp stays in the execute stage: the input latch remains
            // dirty so the same instruction is re-attempted next cycle.
            input.updated = true;
            output.updated = false;
            if st.debug {
                debug!(
                    "[execute/suspend] warp {} could not perform instruction {}",
                    warp.warp_id,
                    inst.op.mnemonic()
                );
            }
            return;
        }
        for lane in &lanes {
            warp.retrying[*lane] = false;
        }

        if result.success && result.counted {
            if is_simt {
                shared.stats.gpu_instrs += lanes.len() as u64;
            } else {
                shared.stats.cpu_instrs += 1;
            }
        }

        // Non-suspended warps with remaining work go straight back to the
        // scheduler; suspended warps are re-inserted by the resume path.
        if !warp.suspended && warp.any_runnable(shared.imem.max_addr()) {
            st.inbox.push_back(input.warp);
        }

        input.updated = false;
        output.updated = result.write_required;
        output.warp = input.warp;
        output.active_lanes = lanes;
        output.inst = inst;

        if st.debug {
            debug!(
                "[execute/suspend] warp {} executed {}",
                st.warps[input.warp].warp_id,
                inst.op.mnemonic()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::behavior::ModuleBehaviors;
    use crate::mem::instr::InstructionMemory;
    use crate::simt::decode::DecodeUnit;
    use crate::simt::pipeline::{Latch, Shared};
    use crate::simt::regfile::SimtRegisterFile;
    use crate::simt::warp::{Warp, WarpRef};
    use crate::tests::asm;
    use smallvec::smallvec;
    use std::collections::VecDeque;
    use std::sync::Arc;

    fn setup(mem_queue_capacity: usize) -> (Shared, PipeState) {
        let config = Arc::new(SimtConfig {
            mem_queue_capacity,
            num_lanes: 1,
            num_warps: 2,
            ..SimtConfig::default()
        });
        let imem = InstructionMemory::new(0x1000, vec![0; 64]);
        let shared = Shared::new(Arc::clone(&config), imem);
        let st = PipeState {
            kind: PipeKind::Simt,
            warps: vec![Warp::new(0, 1, 0x1000, PipeKind::Simt)],
            inbox: VecDeque::new(),
            reg_file: Box::new(SimtRegisterFile::new(config)),
            pipeline_active: true,
            debug: false,
            regdump: false,
        };
        (shared, st)
    }

    #[test]
    fn full_memory_queue_retries_without_advancing_pc() {
        let (mut shared, mut st) = setup(1);

        // occupy the only queue slot with traffic from the other pipeline
        let cpu_req = MemRequest {
            warp: WarpRef {
                kind: PipeKind::Cpu,
                warp_id: 0,
            },
            op: MemOp::Load { zero_extend: false },
            addrs: vec![0x2000],
            bytes: 4,
            rd: 1,
            values: vec![],
            lanes: vec![0],
            pc: 0,
        };
        shared.coalescer.put(cpu_req, &mut shared.stats);
        assert!(!shared.coalescer.can_put());

        let mut ex = ExecuteSuspend::default();
        let mut input = Latch {
            updated: true,
            warp: 0,
            active_lanes: smallvec![0],
            inst: DecodeUnit::decode(asm::lw(5, 10, 0)),
        };
        let mut output = Latch::default();

        // blocked: one retry per cycle, PC frozen, nothing retired
        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert!(input.updated);
        assert!(!output.updated);
        assert_eq!(st.warps[0].pc[0], 0x1000);
        assert!(st.warps[0].retrying[0]);
        assert_eq!(shared.stats.gpu_retries, 1);
        assert_eq!(shared.stats.gpu_instrs, 0);

        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert_eq!(shared.stats.gpu_retries, 2);
        assert_eq!(shared.stats.gpu_instrs, 0);
        assert_eq!(st.warps[0].pc[0], 0x1000);

        // drain the queue into the coalescing pipeline
        shared.coalescer.tick_one();
        assert!(shared.coalescer.can_put());

        // the held instruction now issues; the warp was still flagged as
        // retrying at the start of this cycle, so one more retry is counted
        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert!(!input.updated);
        assert_eq!(st.warps[0].pc[0], 0x1004);
        assert!(st.warps[0].suspended);
        assert!(!st.warps[0].retrying[0]);
        assert_eq!(shared.stats.gpu_retries, 3);
        assert_eq!(shared.stats.gpu_instrs, 1);
        // suspended warps are re-inserted by the resume path, not here
        assert!(st.inbox.is_empty());
    }

    #[test]
    fn busy_divider_forces_retry_until_free() {
        let (mut shared, mut st) = setup(8);
        st.warps[0].pc[0] = 0x1000;
        st.reg_file.write(0, 0, 1, 12);
        st.reg_file.write(0, 0, 2, 5);

        // park a CPU op in the divider so the unit reports busy
        assert!(shared.div.issue(
            WarpRef {
                kind: PipeKind::Cpu,
                warp_id: 0
            },
            smallvec![0],
            3,
            vec![(0, 1)],
        ));

        let mut ex = ExecuteSuspend::default();
        let mut input = Latch {
            updated: true,
            warp: 0,
            active_lanes: smallvec![0],
            inst: DecodeUnit::decode(asm::divu(3, 1, 2)),
        };
        let mut output = Latch::default();

        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert!(input.updated);
        assert_eq!(st.warps[0].pc[0], 0x1000);
        assert_eq!(shared.stats.gpu_retries, 1);

        // run the parked op to completion to free the unit
        for _ in 0..shared.config.div_latency {
            shared.div.tick_one();
        }
        let _ = shared.div.take_completed(PipeKind::Cpu);

        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert!(st.warps[0].suspended);
        assert_eq!(st.warps[0].pc[0], 0x1004);
        assert_eq!(shared.stats.gpu_instrs, 1);
    }

    #[test]
    fn suspended_warp_in_execute_counts_a_bubble() {
        let (mut shared, mut st) = setup(8);
        st.warps[0].suspended = true;

        let mut ex = ExecuteSuspend::default();
        let mut input = Latch {
            updated: true,
            warp: 0,
            active_lanes: smallvec![0],
            inst: DecodeUnit::decode(asm::addi(1, 0, 5)),
        };
        let mut output = Latch::default();
        ex.execute(&mut input, &mut output, &mut st, &mut shared);
        assert_eq!(shared.stats.gpu_susps, 1);
    }
}
