//! System calls serviced in line by running programs.

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use object as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use simulator_core::{
    FuncMemory, FuncSim, Isa, Mips64, MipsI, RiscV32, RiscV64, SimConfig, SimError, SpimSyscalls,
    Trap,
};
use thiserror as _;
use tracing as _;

/// Console output shared between the test and the handler.
#[derive(Clone, Default)]
struct Console(Rc<RefCell<Vec<u8>>>);

impl Console {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("utf-8 console output")
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_with_console<I: Isa>(
    words: &[u32],
    data: &[(u64, &[u8])],
    input: &str,
) -> (Result<Trap, SimError>, String) {
    let mut memory = FuncMemory::new(32).with_start_pc(0x1000);
    memory.write_words(0x1000, words).expect("program fits");
    for &(addr, bytes) in data {
        memory.write_bytes(addr, bytes).expect("data fits");
    }
    let console = Console::default();
    let handler = SpimSyscalls::new(Cursor::new(input.as_bytes().to_vec()), console.clone());
    let mut sim = FuncSim::<I>::with_syscall_handler(SimConfig::default(), Box::new(handler));
    sim.set_memory(Box::new(memory));
    let result = sim.run(100);
    (result, console.text())
}

const MIPS_PRINT_NEGATIVE: [u32; 4] = [
    0x2402_0001, // addiu $v0, $zero, 1
    0x2404_FFF9, // addiu $a0, $zero, -7
    0x0000_000C, // syscall
    0x0000_0008, // jr $zero
];

#[test]
fn mips_print_int_is_signed_at_every_width() {
    let (result, out) = run_with_console::<MipsI>(&MIPS_PRINT_NEGATIVE, &[], "");
    assert_eq!(result.expect("halts"), Trap::Halt);
    assert_eq!(out, "-7");

    let (result, out) = run_with_console::<Mips64>(&MIPS_PRINT_NEGATIVE, &[], "");
    assert_eq!(result.expect("halts"), Trap::Halt);
    assert_eq!(out, "-7");
}

#[rstest]
#[case::rv32(false)]
#[case::rv64(true)]
fn riscv_services_use_a7_and_a0(#[case] wide: bool) {
    let program = [
        0x0010_0893, // addi a7, zero, 1
        0x02A0_0513, // addi a0, zero, 42
        0x0000_0073, // ecall
        0x00B0_0893, // addi a7, zero, 11
        0x00A0_0513, // addi a0, zero, 10
        0x0000_0073, // ecall
        0x0000_0067, // jalr zero, 0(zero)
    ];
    let (result, out) = if wide {
        run_with_console::<RiscV64>(&program, &[], "")
    } else {
        run_with_console::<RiscV32>(&program, &[], "")
    };
    assert_eq!(result.expect("halts"), Trap::Halt);
    assert_eq!(out, "42\n");
}

#[test]
fn strings_are_printed_from_memory() {
    let (result, out) = run_with_console::<MipsI>(
        &[
            0x2402_0004, // addiu $v0, $zero, 4
            0x2404_3000, // addiu $a0, $zero, 0x3000
            0x0000_000C, // syscall
            0x0000_0008, // jr $zero
        ],
        &[(0x3000, b"hello, world\0")],
        "",
    );
    assert_eq!(result.expect("halts"), Trap::Halt);
    assert_eq!(out, "hello, world");
}

#[test]
fn read_int_lands_in_the_result_register() {
    let (result, out) = run_with_console::<MipsI>(
        &[
            0x2402_0005, // addiu $v0, $zero, 5
            0x0000_000C, // syscall
            0x0040_2021, // addu  $a0, $v0, $zero
            0x2402_0001, // addiu $v0, $zero, 1
            0x0000_000C, // syscall
            0x0000_0008, // jr $zero
        ],
        &[],
        "1234\n",
    );
    assert_eq!(result.expect("halts"), Trap::Halt);
    assert_eq!(out, "1234");
}

#[test]
fn unknown_service_aborts_the_run() {
    let (result, out) = run_with_console::<MipsI>(
        &[
            0x2402_0063, // addiu $v0, $zero, 99
            0x0000_000C, // syscall
            0x0000_0008, // jr $zero
        ],
        &[],
        "",
    );
    assert!(matches!(
        result,
        Err(SimError::UnsupportedSyscall { code: 99 })
    ));
    assert!(out.is_empty());
}

#[test]
fn ignored_syscalls_leave_state_alone() {
    let mut memory = FuncMemory::new(32).with_start_pc(0x1000);
    memory
        .write_words(0x1000, &MIPS_PRINT_NEGATIVE)
        .expect("program fits");
    let mut sim = FuncSim::<MipsI>::new(SimConfig::default().with_ignored_syscalls(true));
    sim.set_memory(Box::new(memory));
    assert_eq!(sim.run(10).expect("halts"), Trap::Halt);
    assert_eq!(sim.sequence_id(), 4);
}
