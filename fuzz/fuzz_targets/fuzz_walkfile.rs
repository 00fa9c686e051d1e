#![no_main]

use libfuzzer_sys::fuzz_target;

use simsnmp::walkfile::parse_walkfile;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(store) = parse_walkfile(text) {
            // Whatever parses must satisfy the store's ordering invariant
            let oids: Vec<_> = store.iter().map(|(o, _)| o).collect();
            assert!(oids.windows(2).all(|w| w[0] < w[1]));
        }
    }
});
