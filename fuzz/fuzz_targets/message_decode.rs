//! Inbound message decoding must never panic: it runs on the transport
//! delivery context, where a crash would take down the whole client.
#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = driftwire_proto::ServerMessage::decode(text);
    }
});
