#![no_main]

use json5_cst::{token_kind, Lexer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| fuzz_target(data));

fn fuzz_target(data: &[u8]) {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let mut split = source.len() / 2;
    while !source.is_char_boundary(split) {
        split -= 1;
    }
    let (head, tail) = source.split_at(split);

    let mut lexer = Lexer::new();
    let mut tokens: Vec<String> = lexer.lex(head, true).map(|t| t.source).collect();
    tokens.extend(lexer.lex(tail, false).map(|t| t.source));
    for token in &tokens {
        let _ = token_kind(token);
    }
    assert_eq!(tokens.concat(), source);
}
