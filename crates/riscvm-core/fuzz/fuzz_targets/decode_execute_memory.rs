#![no_main]

use libfuzzer_sys::fuzz_target;
use riscvm_core::{
    disassemble, validate_access, validate_fetch, CoreState, Decoder, Host, Image, StdConsole,
    VmConfig, Width, MEMORY_CAPACITY,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let _ = Decoder::decode(word);
    let _ = disassemble(word);
    let _ = validate_fetch(word);
    let _ = validate_access(word, Width::Word);

    let mut bytes = vec![0_u8; MEMORY_CAPACITY];
    let len = data.len().min(MEMORY_CAPACITY);
    bytes[..len].copy_from_slice(&data[..len]);
    let Ok(image) = Image::from_bytes(&bytes) else {
        return;
    };

    let mut state = CoreState::new(&image);
    let mut console = StdConsole::new(&data[len..], Vec::new());
    let mut host = Host::new(&mut console);
    let config = VmConfig {
        step_limit: Some(4096),
    };
    let _ = riscvm_core::run(&mut state, &mut host, &config);
});
