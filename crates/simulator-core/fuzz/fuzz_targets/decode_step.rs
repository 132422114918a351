#![no_main]

use libfuzzer_sys::fuzz_target;
use simulator_core::{
    FuncMemory, FuncSim, Isa, Mips32, Mips64, MipsI, MipsII, MipsIII, MipsIV, RiscV128, RiscV32,
    RiscV64, SimConfig,
};

fn step_all<I: Isa>(words: &[u32]) {
    let _ = I::decode(words[0], 0x1000);

    let mut memory = FuncMemory::new(32).with_start_pc(0x1000);
    if memory.write_words(0x1000, words).is_err() {
        return;
    }
    let mut sim = FuncSim::<I>::new(SimConfig::default().with_ignored_syscalls(true));
    sim.set_memory(Box::new(memory));
    let _ = sim.run(64);
}

fuzz_target!(|data: &[u8]| {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .take(64)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    if words.is_empty() {
        return;
    }

    step_all::<MipsI>(&words);
    step_all::<MipsII>(&words);
    step_all::<MipsIII>(&words);
    step_all::<MipsIV>(&words);
    step_all::<Mips32>(&words);
    step_all::<Mips64>(&words);
    step_all::<RiscV32>(&words);
    step_all::<RiscV64>(&words);
    step_all::<RiscV128>(&words);
});
