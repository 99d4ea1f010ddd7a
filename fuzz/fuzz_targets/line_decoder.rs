//! Fuzz target for line decoding and segmentation.
//!
//! Decoding must never panic, and neither may segmenting whatever emote
//! ranges the decoded tags claim.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 8191 {
            return;
        }

        let msg = tmi_proto::Message::decode(input);

        if let Some(segmenter) = tmi_proto::Segmenter::for_message(&msg) {
            let _ = segmenter.segments();
        }
    }
});
