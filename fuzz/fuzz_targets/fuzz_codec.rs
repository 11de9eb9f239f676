#![no_main]

use boolsearch::utils::{decode_postings, decode_varint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a postings store: decoding must fail cleanly, never panic
    let _ = decode_varint(data);
    if let Some((&df, store)) = data.split_first() {
        let _ = decode_postings(store, 0, df as u32);
        let _ = decode_postings(store, store.len() as u64 / 2, df as u32);
    }
});
