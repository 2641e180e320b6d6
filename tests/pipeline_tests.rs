//! End-to-end receive pipeline tests against the captured push session.

mod vectors;

use dlms_gateway::dlms::Router;
use dlms_gateway::gateway::ReceivePipeline;

fn feed_all(pipeline: &mut ReceivePipeline, stream: &[u8]) -> Vec<Vec<u8>> {
    let mut apdus = Vec::new();
    for &byte in stream {
        if let Some(apdu) = pipeline.feed_byte(byte) {
            apdus.push(apdu);
        }
    }
    apdus
}

#[test]
fn full_push_session_yields_one_apdu() {
    let stream = vectors::hdlc_push_stream();
    assert_eq!(stream.len(), 443);

    let mut pipeline = ReceivePipeline::new(Router::new());
    let apdus = feed_all(&mut pipeline, &stream);

    assert_eq!(apdus.len(), 1);
    assert_eq!(apdus[0].len(), 364);
    assert_eq!(apdus[0], vectors::apdu_november());
    assert!(pipeline.is_complete());

    let stats = pipeline.stats();
    assert_eq!(stats.frames_received, 4);
    assert_eq!(stats.frames_invalid, 0);
    assert_eq!(stats.blocks_routed, 4);
    assert_eq!(stats.apdus_completed, 1);
}

#[test]
fn push_session_survives_byte_at_a_time_restart() {
    // Deframing twice over the same pipeline must produce a second,
    // identical APDU once the completion flag is cleared.
    let stream = vectors::hdlc_push_stream();
    let mut pipeline = ReceivePipeline::new(Router::new());

    assert_eq!(feed_all(&mut pipeline, &stream).len(), 1);
    pipeline.reset();
    assert!(!pipeline.is_complete());

    let apdus = feed_all(&mut pipeline, &stream);
    assert_eq!(apdus.len(), 1);
    assert_eq!(apdus[0], vectors::apdu_november());
}

#[test]
fn corrupted_second_frame_suppresses_apdu() {
    // Flip one bit in the information field of frame 2: the frame is
    // delivered invalid, reassembly resets, and frames 3 and 4 cannot
    // complete the transfer because no fresh block 1 arrives.
    let mut stream = vectors::hdlc_push_stream();
    assert_eq!(stream[160], 0x08);
    stream[160] ^= 0x01;

    let mut pipeline = ReceivePipeline::new(Router::new());
    let apdus = feed_all(&mut pipeline, &stream);

    assert!(apdus.is_empty());
    assert!(!pipeline.is_complete());

    let stats = pipeline.stats();
    assert_eq!(stats.frames_received, 4);
    assert_eq!(stats.frames_invalid, 1);
}

#[test]
fn recovery_requires_fresh_first_block() {
    // After the corrupted session, replaying the intact stream completes.
    let mut corrupted = vectors::hdlc_push_stream();
    corrupted[160] ^= 0x01;

    let mut pipeline = ReceivePipeline::new(Router::new());
    assert!(feed_all(&mut pipeline, &corrupted).is_empty());

    let apdus = feed_all(&mut pipeline, &vectors::hdlc_push_stream());
    assert_eq!(apdus.len(), 1);
    assert_eq!(apdus[0], vectors::apdu_november());
}

#[test]
fn stray_flag_in_header_does_not_split_frame() {
    // Frame 4 of the capture carries 0x7E as a header byte; the session
    // still deframes into exactly four frames. Feeding only frame 4
    // standalone must produce its block without a phantom frame.
    let stream = vectors::hdlc_push_stream();
    let frame4 = &stream[395..];
    assert_eq!(frame4[0], 0x7E);
    assert!(frame4[1..frame4.len() - 1].contains(&0x7E));

    let mut pipeline = ReceivePipeline::new(Router::new());
    let mut frames_before = 0;
    for &byte in frame4 {
        pipeline.feed_byte(byte);
        frames_before = pipeline.stats().frames_received;
    }
    assert_eq!(frames_before, 1);
}
