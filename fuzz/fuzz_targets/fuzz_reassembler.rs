#![no_main]

use libfuzzer_sys::fuzz_target;
use packet_frame::core::reassembler::FrameReassembler;
use packet_frame::protocol::message::Message;

fuzz_target!(|data: &[u8]| {
    // Arbitrary stream bytes: no panics, no frame above the cap, no hang
    let mut reassembler = FrameReassembler::new();
    let max = reassembler.max_frame_size();
    let _ = reassembler.feed(data, |frame| {
        assert!(frame.len() >= 5 && frame.len() <= max);
        let id = i16::from_le_bytes([frame[2], frame[3]]);
        let _ = Message::decode(id, &frame[5..]);
    });
});
