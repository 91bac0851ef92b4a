use mcs51_sim::asm::AsmErr;
use mcs51_sim::ctl::{Controller, CtlErr, FlagPresets};
use mcs51_sim::sim::debug::Breakpoint;
use mcs51_sim::sim::{EngineState, SimErr, SimFlags};

#[test]
fn add_registers_scenario() {
    let mut ctl = Controller::new();
    ctl.assemble(&["MOV R0, #5", "MOV R1, #3", "ADD R0, R1"], None).unwrap();
    let state = ctl.run().unwrap();

    assert_eq!(state.general_purpose_registers[0][0], 8);
    assert!(!state.flags.cy());
    assert_eq!(state.index, 3);
    assert!(state.ready);
}

#[test]
fn run_once_after_halt_is_noop() {
    let mut ctl = Controller::new();
    ctl.assemble(&["ADD R0, R1"], None).unwrap();

    let first = ctl.run_once().unwrap();
    let second = ctl.run_once().unwrap();
    assert_eq!(first, second);
    assert_eq!(second.index, 1);
    assert_eq!(ctl.simulator().state(), EngineState::Halted);
}

#[test]
fn unresolved_label_keeps_state() {
    let mut ctl = Controller::new();

    // No program yet
    let err = ctl.assemble(&["JMP undefined_label"], None).unwrap_err();
    assert_eq!(err, CtlErr::Asm(AsmErr::UnresolvedLabel { line: 0, label: "undefined_label".into() }));
    assert!(!ctl.is_ready());

    // With a program
    ctl.assemble(&["MOV A, #1", "MOV A, #2"], None).unwrap();
    ctl.run_once().unwrap();
    let before = ctl.state();
    assert!(ctl.assemble(&["JMP undefined_label"], None).is_err());
    assert_eq!(ctl.state(), before);
    assert_eq!(ctl.run_index(), 1);
}

#[test]
fn write_out_of_range() {
    let mut ctl = Controller::new();
    ctl.write_memory(0x10, 0xAB).unwrap();
    let before = ctl.state();

    let err = ctl.write_memory(0x200, 1).unwrap_err();
    assert_eq!(err, CtlErr::Sim(SimErr::InvalidAddress(0x200)));
    assert_eq!(ctl.state(), before);
}

#[test]
fn reassemble_is_deterministic() {
    let src = [
        "      MOV R0, #10h",
        "      MOV R7, #4",
        "LOOP: MOV @R0, A",
        "      ADD A, #33h",
        "      INC R0",
        "      DJNZ R7, LOOP",
        "      SETB RS0",
        "      MOV R1, A",
    ];
    let mut ctl = Controller::new();
    ctl.assemble(&src, None).unwrap();
    let first = ctl.run().unwrap();

    ctl.reset();
    ctl.assemble(&src, None).unwrap();
    let second = ctl.run().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.general_purpose_registers[1][1], 0xCC);
    assert_eq!(second.ram[1][0..4], [(0x10, 0), (0x11, 0x33), (0x12, 0x66), (0x13, 0x99)]);
}

#[test]
fn reset_clears_everything() {
    let mut ctl = Controller::new();
    ctl.assemble(&["MOV A, #0FFh", "MOV 7Fh, A", "ORG 0", "DB 9"], None).unwrap();
    ctl.run().unwrap();

    let state = ctl.reset();
    assert!(!state.ready);
    assert_eq!(state.index, 0);
    assert!(state.assembler.is_empty());
    assert!(state.ram.iter().chain(&state.sfr).chain(&state.rom).flatten().all(|&(_, v)| v == 0));
    assert_eq!(ctl.run(), Err(CtlErr::NotReady));
}

#[test]
fn parity_tracks_accumulator() {
    let mut ctl = Controller::new();
    ctl.assemble(&["MOV A, #1", "INC A", "INC A", "CPL A", "CLR A"], None).unwrap();

    // (A, parity) after each instruction
    let expected = [(0x01, true), (0x02, true), (0x03, false), (0xFC, false), (0x00, false)];
    for (acc, parity) in expected {
        let state = ctl.run_once().unwrap();
        assert_eq!(state.registers.a, acc);
        assert_eq!(state.flags.p(), parity, "parity of {acc:#04X}");
    }
}

#[test]
fn timeout_then_inspect() {
    let mut ctl = Controller::with_flags(SimFlags { max_steps: 1000 });
    ctl.assemble(&["LOOP: INC 30h", "SJMP LOOP"], None).unwrap();

    assert_eq!(ctl.run(), Err(CtlErr::Sim(SimErr::ExecutionTimeout { limit: 1000 })));
    assert_eq!(ctl.read_memory(0x30), Ok((500 % 256) as u8));
}

#[test]
fn breakpoints_and_stepping() {
    let src = [
        "       MOV SP, #40h",
        "       CALL DOUBLE",
        "       CALL DOUBLE",
        "       SJMP FINISH",
        "DOUBLE: ADD A, #1",
        "       RL A",
        "       RET",
        "FINISH:",
    ];
    let mut ctl = Controller::new();
    ctl.assemble(&src, None).unwrap();

    ctl.run_once().unwrap();
    let state = ctl.step_over().unwrap();
    assert_eq!((state.index, state.registers.a), (2, 2));

    ctl.run_once().unwrap();
    assert_eq!(ctl.run_index(), 4);
    let state = ctl.step_out().unwrap();
    assert_eq!((state.index, state.registers.a), (3, 6));

    ctl.reset();
    ctl.assemble(&src, None).unwrap();
    ctl.simulator_mut().breakpoints.insert(Breakpoint::Index(6));
    let state = ctl.run().unwrap();
    assert_eq!(state.index, 6);
    assert!(ctl.simulator().hit_breakpoint());
}

#[test]
fn presets_apply_on_success() {
    let mut ctl = Controller::new();
    let mut presets = FlagPresets::new();
    presets.insert("CY", 1);
    presets.insert("RS1", 1);

    ctl.assemble(&["CLR A", "ADDC A, #0", "MOV R2, A"], Some(&presets)).unwrap();
    let state = ctl.run().unwrap();
    assert_eq!(state.registers.a, 1);
    assert_eq!(state.general_purpose_registers[2][2], 1);
    assert_eq!(state.general_purpose_registers[0][2], 0);
}
