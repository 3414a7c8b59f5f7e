#![no_main]

use json5_cst::{parse_all_with, ComposeOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| fuzz_target(data));

fn fuzz_target(data: &[u8]) {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let options = ComposeOptions::new()
        .with_int_as_bigint(data.len() % 2 == 0)
        .with_max_depth(32);
    for doc in parse_all_with(source, &options) {
        let _ = doc.to_value();
    }
}
