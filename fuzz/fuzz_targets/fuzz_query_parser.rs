#![no_main]

use boolsearch::index::{IndexReader, build_in_memory};
use boolsearch::query::{QueryExecutor, compile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Compiling never fails; evaluation may reject the program but must not panic
    let _ = compile(data);

    let reader = IndexReader::from_artifacts(build_in_memory(["cats run", "cat ran", "dog walks"]));
    let _ = QueryExecutor::new(&reader).search(data, 10);
});
