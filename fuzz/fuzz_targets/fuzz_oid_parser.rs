#![no_main]

use libfuzzer_sys::fuzz_target;

use simsnmp::oid::Oid;

fuzz_target!(|data: &[u8]| {
    // Fuzz text parsing
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(oid) = Oid::parse(text) {
            // A parsed OID must survive a BER round trip
            let encoded = oid.to_ber();
            let decoded = Oid::from_ber(&encoded).expect("reencode must decode");
            assert_eq!(decoded, oid);
        }
    }

    // Fuzz BER subidentifier decoding directly
    let _ = Oid::from_ber(data);
});
