//! CLI entry point for the functional simulator.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use simulator_core::{
    create_simulator, load_elf_file, load_flat, FuncMemory, IsaKind, LoadError, Memory, SimConfig,
    SimError, Trap,
};
#[cfg(test)]
use tempfile as _;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_INSTRUCTION_LIMIT: u64 = 1_000_000;

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(
    name = "funcsim",
    version,
    about = "Functional simulator for MIPS and RISC-V programs",
    long_about = "Runs a program on one of the supported ISA variants until it halts, \
                  faults or reaches the instruction limit.\n\n\
                  Variants: mips1 mips2 mips3 mips4 mips32 mips64 riscv32 riscv64 riscv128\n\n\
                  Examples:\n  funcsim --isa mips32 --binary hello.elf\n  \
                  funcsim --isa riscv64 --binary image.bin --flat 0x80000000 -n 500 --disassembly"
)]
struct Cli {
    /// ISA variant to simulate.
    #[arg(short, long)]
    isa: IsaKind,

    /// Program to run: an ELF executable, or a raw image with `--flat`.
    #[arg(short, long)]
    binary: PathBuf,

    /// Maximum number of instructions to retire.
    #[arg(short = 'n', long, default_value_t = DEFAULT_INSTRUCTION_LIMIT)]
    instructions: u64,

    /// Print every retired instruction to stdout.
    #[arg(short, long)]
    disassembly: bool,

    /// Ignore system calls instead of emulating console services.
    #[arg(long)]
    no_syscalls: bool,

    /// Treat the binary as a raw image loaded and started at this address.
    #[arg(long, value_name = "BASE", value_parser = parse_address)]
    flat: Option<u64>,

    /// Print the register file once the run ends.
    #[arg(long)]
    dump_registers: bool,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig::default()
            .with_log(self.disassembly)
            .with_ignored_syscalls(self.no_syscalls)
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal address.
fn parse_address(text: &str) -> Result<u64, String> {
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address `{text}`: {e}"))
}

fn load_program(cli: &Cli) -> Result<FuncMemory, i32> {
    let loaded = match cli.flat {
        Some(base) => std::fs::read(&cli.binary)
            .map_err(LoadError::from)
            .and_then(|bytes| load_flat(&bytes, base, cli.isa.xlen().min(64))),
        None => load_elf_file(&cli.binary, cli.isa),
    };
    loaded.map_err(|e| {
        eprintln!("error: {}: {e}", cli.binary.display());
        1
    })
}

const fn exit_code(error: &SimError) -> i32 {
    match error {
        SimError::RunawayExecution { .. } => 3,
        SimError::MemoryNotBound
        | SimError::Memory(_)
        | SimError::IllegalInstruction { .. }
        | SimError::UnsupportedSyscall { .. }
        | SimError::Io(_) => 2,
    }
}

fn run(cli: &Cli) -> Result<(), i32> {
    let memory = load_program(cli)?;
    debug!(isa = %cli.isa, entry = memory.start_pc(), "program loaded");

    let mut sim = create_simulator(cli.isa, cli.config());
    sim.set_memory(Box::new(memory));

    let outcome = sim.run(cli.instructions);

    if cli.dump_registers {
        print!("{}", sim.dump_registers());
    }

    match outcome {
        Ok(Trap::Halt) => {
            info!(retired = sim.sequence_id(), "program halted");
            Ok(())
        }
        Ok(_) => {
            eprintln!(
                "warning: instruction limit of {} reached at pc {:#x}",
                cli.instructions,
                sim.pc()
            );
            Ok(())
        }
        Err(error) => {
            eprintln!("error: {error} (class: {:?})", error.class());
            Err(exit_code(&error))
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(()) => 0,
        Err(code) => code,
    };

    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_minimal_invocation_with_defaults() {
        let cli = Cli::try_parse_from(["funcsim", "--isa", "mips32", "--binary", "a.elf"])
            .expect("minimal args should parse");

        assert_eq!(
            cli,
            Cli {
                isa: IsaKind::Mips32,
                binary: PathBuf::from("a.elf"),
                instructions: DEFAULT_INSTRUCTION_LIMIT,
                disassembly: false,
                no_syscalls: false,
                flat: None,
                dump_registers: false,
            }
        );
        assert_eq!(cli.config(), SimConfig::default());
    }

    #[test]
    fn parses_every_flag() {
        let cli = Cli::try_parse_from([
            "funcsim",
            "-i",
            "RISCV128",
            "-b",
            "image.bin",
            "-n",
            "42",
            "--disassembly",
            "--no-syscalls",
            "--flat",
            "0x8000_0000",
            "--dump-registers",
        ])
        .expect("full args should parse");

        assert_eq!(cli.isa, IsaKind::RiscV128);
        assert_eq!(cli.instructions, 42);
        assert_eq!(cli.flat, Some(0x8000_0000));
        assert!(cli.dump_registers);
        assert_eq!(
            cli.config(),
            SimConfig {
                log_enabled: true,
                ignore_syscalls: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_isa() {
        let error = Cli::try_parse_from(["funcsim", "--isa", "sparc", "--binary", "a.elf"])
            .expect_err("unknown ISA should fail");
        assert!(error.to_string().contains("unknown ISA"));
    }

    #[test]
    fn requires_isa_and_binary() {
        assert!(Cli::try_parse_from(["funcsim", "--binary", "a.elf"]).is_err());
        assert!(Cli::try_parse_from(["funcsim", "--isa", "mips1"]).is_err());
    }

    #[test]
    fn addresses_accept_decimal_and_hex() {
        assert_eq!(parse_address("4096"), Ok(4096));
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("0XFFFF_0000"), Ok(0xFFFF_0000));
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("ten").is_err());
    }

    #[test]
    fn runaway_has_its_own_exit_code() {
        let runaway = SimError::RunawayExecution { pc: 0, nops: 11 };
        assert_eq!(exit_code(&runaway), 3);
        assert_eq!(exit_code(&SimError::MemoryNotBound), 2);
    }
}
