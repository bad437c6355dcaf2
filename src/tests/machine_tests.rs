//! Machine-level scenarios: host launch protocol plus kernels assembled
//! in-process and run on the full two-pipeline machine.

use super::asm;
use super::{build_sim, run_to_completion};
use crate::simt::config::SimtConfig;

const BASE: u64 = 0x1_0000;

/// Host code first, kernel appended; returns (image words, kernel pc).
fn assemble(
    kernel: &[u32],
    warps_per_block: u32,
    arg_ptr: u32,
    uart: &[u8],
    stat_out: u32,
) -> (Vec<u32>, u32) {
    let probe = asm::host_launch_program(0, warps_per_block, arg_ptr, uart, stat_out);
    let kernel_pc = BASE as u32 + probe.len() as u32 * 4;
    let mut words = asm::host_launch_program(kernel_pc, warps_per_block, arg_ptr, uart, stat_out);
    assert_eq!(words.len(), probe.len());
    words.extend_from_slice(kernel);
    (words, kernel_pc)
}

#[test]
fn gradient_kernel_fills_framebuffer() {
    // 64 warps x 32 lanes, one pixel per thread: a 64x32 gradient.
    const FB: u32 = 0x8_0000;
    const STAT_OUT: u32 = 0xA_0000;
    let mut kernel = vec![
        asm::csrrw(5, 0xF14, 0), // hart id
        asm::andi(6, 5, 63),     // x
        asm::srli(7, 5, 6),      // y
        asm::slli(8, 6, 8),
        asm::sub(8, 8, 6),       // x * 255
        asm::addi(9, 0, 63),
        asm::divu(10, 8, 9),     // red
        asm::slli(11, 7, 8),
        asm::sub(11, 11, 7),     // y * 255
        asm::divu(12, 11, 9),    // green
        asm::slli(10, 10, 16),
        asm::slli(12, 12, 8),
        asm::or(10, 10, 12),
        asm::ori(10, 10, 128),
    ];
    kernel.extend(asm::li32(13, FB));
    kernel.extend([
        asm::slli(14, 5, 2),
        asm::add(13, 13, 14),
        asm::sw(10, 13, 0),
        asm::addi(15, 0, 1),
        asm::csrrw(0, 0x830, 15), // terminate the warp
    ]);
    let kernel_len = kernel.len() as u64;

    let (words, _) = assemble(&kernel, 0, 0, b"ok", STAT_OUT);
    let config = SimtConfig {
        num_warps: 64,
        num_lanes: 32,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    let mem = sim.shared.coalescer.memory();
    for hart in 0u64..(64 * 32) {
        let x = hart & 63;
        let y = hart >> 6;
        let expected = (((x * 255 / 63) << 16) | ((y * 255 / 63) << 8) | 128) as u32;
        let got = mem.load(FB as u64 + hart * 4, 4) as u32;
        assert_eq!(got, expected, "pixel ({}, {})", x, y);
    }

    // every kernel instruction retires once per lane
    let stats = &sim.shared.stats;
    assert_eq!(stats.gpu_instrs, kernel_len * 64 * 32);
    assert!(stats.gpu_cycles > 0);
    assert!(stats.gpu_dram_accs > 0);

    // the host saw the kernel finish, emitted its bytes, and read a stat back
    assert_eq!(sim.shared.ctrl.uart_output(), "ok");
    // the stat was sampled while the tail of the pipeline was draining, so
    // it can trail the final count slightly
    let cycles_seen = mem.load(STAT_OUT as u64, 4);
    assert!(cycles_seen > 0);
    assert!(cycles_seen <= stats.gpu_cycles);
}

#[test]
fn if_else_reconverges_after_nesting_pop() {
    const SLOT0: u32 = 0x8_0000;
    const SLOT1: u32 = 0x8_0100;
    const SLOT2: u32 = 0x8_0200;

    // if (lane < 16) { slot0[lane] = 1 } else { slot1[lane] = 2 }
    // slot2[lane] = 3
    // compiled as two guarded regions with the nesting push inside the
    // taken path, popping just before the join point
    let mut kernel = vec![
        asm::csrrw(5, 0xF14, 0),
        asm::andi(6, 5, 31),
        asm::addi(7, 0, 16),
        asm::bge(6, 7, 36), // lanes >= 16 skip the then-block (to +9 insts)
        asm::noclpush(),
    ];
    kernel.extend(asm::li32(9, SLOT0));
    kernel.extend([
        asm::slli(10, 6, 2),
        asm::add(9, 9, 10),
        asm::addi(11, 0, 1),
        asm::sw(11, 9, 0),
        asm::noclpop(),
        asm::blt(6, 7, 36), // lanes < 16 skip the else-block
        asm::noclpush(),
    ]);
    kernel.extend(asm::li32(9, SLOT1));
    kernel.extend([
        asm::slli(10, 6, 2),
        asm::add(9, 9, 10),
        asm::addi(11, 0, 2),
        asm::sw(11, 9, 0),
        asm::noclpop(),
    ]);
    kernel.extend(asm::li32(9, SLOT2));
    kernel.extend([
        asm::slli(10, 6, 2),
        asm::add(9, 9, 10),
        asm::addi(11, 0, 3),
        asm::sw(11, 9, 0),
        asm::jalr(0, 0, 0), // per-lane termination
    ]);

    let (words, _) = assemble(&kernel, 0, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 1,
        num_lanes: 32,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    let mem = sim.shared.coalescer.memory();
    for lane in 0u64..32 {
        let slot0 = mem.load(SLOT0 as u64 + lane * 4, 4) as u32;
        let slot1 = mem.load(SLOT1 as u64 + lane * 4, 4) as u32;
        let slot2 = mem.load(SLOT2 as u64 + lane * 4, 4) as u32;
        if lane < 16 {
            assert_eq!(slot0, 1, "lane {} then-slot", lane);
            assert_eq!(slot1, 0, "lane {} else-slot", lane);
        } else {
            assert_eq!(slot0, 0, "lane {} then-slot", lane);
            assert_eq!(slot1, 2, "lane {} else-slot", lane);
        }
        assert_eq!(slot2, 3, "lane {} common slot", lane);
    }

    // every lane is back at depth 0 and retired
    let warp = &sim.gpu.state.warps[0];
    assert!(warp.nesting_level.iter().all(|n| *n == 0));
    assert!(warp.finished.iter().all(|f| *f));
}

#[test]
fn barrier_holds_warps_until_all_arrive() {
    const CTR: u32 = 0x8_0000;
    const OBS: u32 = 0x8_0100;

    // each lane bumps a global counter, syncs on the barrier, then records
    // the counter value it observes afterwards
    let mut kernel = vec![asm::csrrw(5, 0xF14, 0)];
    kernel.extend(asm::li32(20, CTR));
    kernel.extend([
        asm::addi(6, 0, 1),
        asm::amoadd_w(7, 6, 20),
        asm::csrrw(0, 0x830, 0), // barrier
        asm::lw(8, 20, 0),
    ]);
    kernel.extend(asm::li32(21, OBS));
    kernel.extend([
        asm::slli(9, 5, 2),
        asm::add(21, 21, 9),
        asm::sw(8, 21, 0),
        asm::addi(10, 0, 1),
        asm::csrrw(0, 0x830, 10), // terminate
    ]);

    let (words, _) = assemble(&kernel, 4, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 4,
        num_lanes: 8,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    // nobody left the barrier before all 4 warps (32 lanes) had arrived,
    // so every observation sees the full count
    let mem = sim.shared.coalescer.memory();
    assert_eq!(mem.load(CTR as u64, 4), 32);
    for hart in 0u64..32 {
        assert_eq!(mem.load(OBS as u64 + hart * 4, 4), 32, "hart {}", hart);
    }
}

#[test]
fn divide_result_reaches_dependent_add() {
    const OUT: u32 = 0x8_0000;
    let mut kernel = vec![
        asm::addi(5, 0, -7),
        asm::addi(6, 0, 2),
        asm::div(7, 5, 6), // -3
        asm::add(8, 7, 0), // dependent on the divider writeback
    ];
    kernel.extend(asm::li32(9, OUT));
    kernel.extend([asm::sw(8, 9, 0), asm::jalr(0, 0, 0)]);

    let (words, _) = assemble(&kernel, 0, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 1,
        num_lanes: 1,
        ..SimtConfig::default()
    };
    let div_latency = config.div_latency;
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    let mem = sim.shared.coalescer.memory();
    assert_eq!(mem.load(OUT as u64, 4) as u32, -3i32 as u32);
    // the suspension shows up in the kernel cycle count
    assert!(sim.shared.stats.gpu_cycles > div_latency);
}

#[test]
fn broadcast_load_counts_one_dram_access() {
    const ADDR: u32 = 0x8_0040;
    let mut kernel = vec![];
    kernel.extend(asm::li32(10, ADDR));
    kernel.extend([asm::lw(5, 10, 0), asm::jalr(0, 0, 0)]);

    let (words, _) = assemble(&kernel, 0, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 1,
        num_lanes: 32,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    // all 32 lanes hit the same word: one SameAddress transaction
    assert_eq!(sim.shared.stats.gpu_dram_accs, 1);
    assert_eq!(sim.shared.stats.gpu_instrs, 4 * 32);
}

#[test]
fn narrow_loads_round_trip_with_extension() {
    const DAT: u32 = 0x8_0000;
    const OUT: u32 = 0x8_0100;

    // store 0xFF as a byte, read it back signed and unsigned
    let mut kernel = vec![];
    kernel.extend(asm::li32(10, DAT));
    kernel.extend(asm::li32(11, OUT));
    kernel.extend([
        asm::addi(5, 0, 0xFF),
        asm::sb(5, 10, 0),
        asm::lb(6, 10, 0),  // -1
        asm::lbu(7, 10, 0), // 255
        asm::sw(6, 11, 0),
        asm::sw(7, 11, 4),
        asm::jalr(0, 0, 0),
    ]);

    let (words, _) = assemble(&kernel, 0, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 1,
        num_lanes: 1,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    let mem = sim.shared.coalescer.memory();
    assert_eq!(mem.load(OUT as u64, 4) as u32, u32::MAX);
    assert_eq!(mem.load(OUT as u64 + 4, 4) as u32, 0xFF);
}

#[test]
fn jalr_to_zero_terminates_the_lane() {
    let kernel = vec![asm::addi(5, 0, 3), asm::jalr(0, 0, 0)];
    let (words, _) = assemble(&kernel, 0, 0, b"", 0xA_0000);
    let config = SimtConfig {
        num_warps: 1,
        num_lanes: 4,
        ..SimtConfig::default()
    };
    let mut sim = build_sim(BASE, &words, config);
    run_to_completion(&mut sim);

    let warp = &sim.gpu.state.warps[0];
    assert!(warp.finished.iter().all(|f| *f));
    assert_eq!(sim.shared.stats.gpu_instrs, 2 * 4);
}
