#![no_main]

use json5_cst::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| fuzz_target(data));

fn fuzz_target(data: &[u8]) {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let mut parser = Parser::new();
    parser.track_lines();
    let mut out = String::new();
    for token in parser.parse(source, false) {
        token.write_source(&mut out);
    }
    assert_eq!(out, source);
}
