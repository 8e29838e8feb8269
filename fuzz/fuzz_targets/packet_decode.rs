//! Fuzz target for websocket frame decoding.
//!
//! Any frame that decodes must re-encode, and the re-encoded frame must
//! decode to the same packet.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quizcast_proto::{Packet, ServerEvent, SocketPacket};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(packet) = Packet::decode(frame) else {
        return;
    };

    if let Packet::Message(SocketPacket::Event { name, args, .. }) = &packet {
        let _ = ServerEvent::from_event(name, args.clone());
    }

    let encoded = packet.encode().expect("decoded packet must encode");
    let again = Packet::decode(&encoded).expect("encoded packet must decode");
    assert_eq!(packet, again);
});
