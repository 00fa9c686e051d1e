#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use simsnmp::pdu::{Message, Pdu};
use simsnmp::ber::Decoder;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    // Fuzz the full message envelope decoder
    if let Ok(message) = Message::decode(bytes.clone()) {
        // Anything that decodes must re-encode to something decodable
        let reencoded = Message::decode(message.encode()).expect("reencode must decode");
        assert_eq!(reencoded, message);
    }

    // Fuzz the PDU decoder directly
    let mut decoder = Decoder::new(bytes);
    let _ = Pdu::decode(&mut decoder);
});
