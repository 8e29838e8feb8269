//! Fuzz target for REST envelope decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quizcast_proto::{CurrentQuestion, Envelope, JoinResponse};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(envelope) = Envelope::from_json(body) else {
        return;
    };

    let _ = envelope.clone().into_result::<JoinResponse>();
    if let Ok(current) = envelope.into_result::<CurrentQuestion>() {
        let _ = current.active();
    }
});
