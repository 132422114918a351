//! Minimal ELF executables shared by the loader and CLI tests.

#![allow(dead_code)]

/// `e_machine` of MIPS objects.
pub const EM_MIPS: u16 = 8;
/// `e_machine` of RISC-V objects.
pub const EM_RISCV: u16 = 243;

/// Shape of a one-segment executable whose `PT_LOAD` segment starts at the
/// entry point.
#[derive(Debug, Clone, Copy)]
pub struct ElfImage {
    machine: u16,
    wide: bool,
    big_endian: bool,
}

impl ElfImage {
    /// Little-endian ELF32 for `machine`.
    pub const fn new(machine: u16) -> Self {
        Self {
            machine,
            wide: false,
            big_endian: false,
        }
    }

    /// Switches to the ELF64 class.
    pub const fn wide(mut self) -> Self {
        self.wide = true;
        self
    }

    /// Switches to big-endian data encoding.
    pub const fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Encodes `words` as the program loaded and entered at `entry`.
    pub fn build(self, entry: u64, words: &[u32]) -> Vec<u8> {
        let (ehdr, phdr) = if self.wide { (64_u16, 56_u16) } else { (52, 32) };
        let mut out = Writer {
            bytes: Vec::new(),
            big_endian: self.big_endian,
            wide: self.wide,
        };
        let payload: Vec<u8> = words
            .iter()
            .flat_map(|&w| {
                if self.big_endian {
                    w.to_be_bytes()
                } else {
                    w.to_le_bytes()
                }
            })
            .collect();
        let size = u64::try_from(payload.len()).expect("small payload");

        out.bytes.extend_from_slice(&[0x7F, b'E', b'L', b'F']);
        out.bytes.push(if self.wide { 2 } else { 1 });
        out.bytes.push(if self.big_endian { 2 } else { 1 });
        out.bytes.push(1);
        out.bytes.resize(16, 0);

        out.half(2);
        out.half(self.machine);
        out.word(1);
        out.addr(entry);
        out.addr(u64::from(ehdr));
        out.addr(0);
        out.word(0);
        out.half(ehdr);
        out.half(phdr);
        out.half(1);
        out.half(if self.wide { 64 } else { 40 });
        out.half(0);
        out.half(0);

        let offset = u64::from(ehdr + phdr);
        if self.wide {
            out.word(1);
            out.word(5);
            for field in [offset, entry, entry, size, size, 4] {
                out.addr(field);
            }
        } else {
            out.word(1);
            for field in [offset, entry, entry, size, size] {
                out.addr(field);
            }
            out.word(5);
            out.word(4);
        }

        out.bytes.extend_from_slice(&payload);
        out.bytes
    }
}

struct Writer {
    bytes: Vec<u8>,
    big_endian: bool,
    wide: bool,
}

impl Writer {
    fn half(&mut self, value: u16) {
        let raw = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.bytes.extend_from_slice(&raw);
    }

    fn word(&mut self, value: u32) {
        let raw = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.bytes.extend_from_slice(&raw);
    }

    fn addr(&mut self, value: u64) {
        if !self.wide {
            self.word(u32::try_from(value).expect("ELF32 address"));
            return;
        }
        let raw = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.bytes.extend_from_slice(&raw);
    }
}

/// `addiu $v0, $zero, 1 ; addiu $a0, $zero, -7 ; syscall ; jr $zero`
pub const MIPS_PRINT_NEGATIVE: [u32; 4] = [0x2402_0001, 0x2404_FFF9, 0x0000_000C, 0x0000_0008];

/// `addi a7, zero, 1 ; addi a0, zero, 42 ; ecall ; jalr zero, 0(zero)`
pub const RISCV_PRINT_42: [u32; 4] = [0x0010_0893, 0x02A0_0513, 0x0000_0073, 0x0000_0067];
