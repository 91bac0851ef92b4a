use proptest::prelude::*;

use mcs51_sim::ast::Reg;
use mcs51_sim::ctl::{Controller, CtlErr};
use mcs51_sim::sim::mem::{MemoryBank, RegisterFile, RAM_SIZE};
use mcs51_sim::sim::{SimErr, Simulator};

proptest! {
    #[test]
    fn write_then_read_wraps(addr in 0u16..=0xFF, value in any::<u32>()) {
        let mut ctl = Controller::new();
        ctl.write_memory(addr, value).unwrap();
        prop_assert_eq!(ctl.read_memory(addr).unwrap(), (value % 256) as u8);
    }

    #[test]
    fn write_out_of_range_changes_nothing(addr in 0x100u16..=u16::MAX, value in any::<u32>()) {
        let mut ctl = Controller::new();
        let before = ctl.state();
        prop_assert_eq!(ctl.write_memory(addr, value), Err(CtlErr::Sim(SimErr::InvalidAddress(usize::from(addr)))));
        prop_assert_eq!(ctl.state(), before);
    }

    #[test]
    fn bank_writes_are_isolated(bank in 0u8..4, reg in 0u8..8, value in any::<u8>()) {
        let reg = Reg::try_from(reg).unwrap();
        let mut regs = RegisterFile::new();
        regs.write(bank, reg, value).unwrap();

        for other in (0..4).filter(|&b| b != bank) {
            prop_assert_eq!(regs.read(other, reg).unwrap(), 0);
        }
        prop_assert_eq!(regs.read(bank, reg).unwrap(), value);
    }

    #[test]
    fn fill_from_is_address_ordered(entries in proptest::collection::btree_map(0u16..0x100, any::<u8>(), 0..64)) {
        let bank = MemoryBank::fill_from(&entries, RAM_SIZE).unwrap();
        for (addr, &byte) in (0u16..).zip(bank.as_slice()) {
            prop_assert_eq!(byte, entries.get(&addr).copied().unwrap_or(0));
        }
    }

    #[test]
    fn parity_matches_accumulator(value in any::<u8>()) {
        let mut ctl = Controller::new();
        ctl.assemble(&[format!("MOV A, #{value}")], None).unwrap();
        let state = ctl.run().unwrap();
        prop_assert_eq!(state.flags.p(), value.count_ones() % 2 == 1);
    }

    #[test]
    fn add_sets_carry_on_overflow(a in any::<u8>(), b in any::<u8>()) {
        let mut sim = Simulator::default();
        let program = mcs51_sim::asm::assemble(&[format!("MOV A, #{a}"), format!("ADD A, #{b}")]).unwrap();
        sim.load_program(program).unwrap();
        sim.run().unwrap();

        let (sum, carry) = a.overflowing_add(b);
        prop_assert_eq!(sim.acc(), sum);
        prop_assert_eq!(sim.psw().cy(), carry);
        prop_assert_eq!(sim.psw().ov(), (a as i8).checked_add(b as i8).is_none());
    }
}
