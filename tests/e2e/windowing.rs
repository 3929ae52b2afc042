//! E2E tests for moving the buffer window around a file

use crate::common::harness::{sample_data, HandlerHarness};
use hexview::BufferOptions;

/// Initial load from an empty handler requests the focal chunk and the ones below it
#[test]
fn test_initial_load_requests_window() {
    let mut harness = HandlerHarness::new(16, sample_data(1024));

    let evicted = harness.ensure_buffer(0, 0, 2);
    assert!(evicted.is_empty());
    assert_eq!(harness.handler.pending_chunks(), vec![0, 16, 32]);

    harness.wait_idle();

    assert_eq!(harness.gateway.requested_offsets(), vec![0, 16, 32]);
    assert!(harness.gateway.requests().iter().all(|(_, n)| *n == 16));
    assert_eq!(harness.handler.resident_chunks(), vec![0, 16, 32]);
    assert!(harness.handler.pending_chunks().is_empty());

    let mut offsets = harness.rendered_offsets();
    offsets.sort_unstable();
    assert_eq!(offsets, (0..48).collect::<Vec<u64>>());
}

/// Moving down by one chunk with a top buffer of one evicts everything above it
#[test]
fn test_scroll_down_evicts_chunks_above() {
    let mut harness = HandlerHarness::new(16, sample_data(1024));
    harness.handler.process_chunks(0, &sample_data(48));
    assert_eq!(harness.handler.resident_chunks(), vec![0, 16, 32]);

    let evicted = harness.ensure_buffer(48, 1, 0);
    assert_eq!(evicted, vec![0, 16]);
    assert!(!harness.handler.has_chunk(0));
    assert!(!harness.handler.has_chunk(20));
    assert!(harness.handler.has_chunk(40));

    harness.wait_idle();
    assert_eq!(harness.gateway.requested_offsets(), vec![48]);
    assert_eq!(harness.handler.resident_chunks(), vec![32, 48]);
}

/// A large top buffer at offset zero never requests below zero or twice at zero
#[test]
fn test_top_buffer_clamped_at_file_start() {
    let mut harness = HandlerHarness::new(16, sample_data(1024));

    harness.ensure_buffer(0, 5, 0);
    harness.wait_idle();

    assert_eq!(harness.gateway.requests(), vec![(0, 16)]);
    assert_eq!(harness.handler.resident_chunks(), vec![0]);
}

/// Repeating the same call while fetches are outstanding requests nothing new
#[test]
fn test_repeated_ensure_buffer_is_idempotent() {
    let mut harness = HandlerHarness::gated(16, sample_data(1024));

    harness.ensure_buffer(32, 1, 1);
    let plan = harness.handler.plan_buffer(32, BufferOptions::new(1, 1));
    assert!(plan.is_empty());

    let evicted = harness.ensure_buffer(32, 1, 1);
    assert!(evicted.is_empty());
    assert_eq!(harness.handler.pending_chunks(), vec![16, 32, 48]);

    harness.gateway.release(3);
    harness.wait_idle();
    assert_eq!(harness.gateway.request_count(), 3);

    // Once resident the same call is still a no-op
    let evicted = harness.ensure_buffer(32, 1, 1);
    assert!(evicted.is_empty());
    assert!(harness.handler.pending_chunks().is_empty());
    assert_eq!(harness.gateway.request_count(), 3);
}

/// Jumping far away replaces the whole window in one step
#[test]
fn test_far_jump_replaces_window() {
    let mut harness = HandlerHarness::new(16, sample_data(64 * 1024));
    harness.ensure_buffer(0, 0, 2);
    harness.wait_idle();

    let evicted = harness.ensure_buffer(40_000, 1, 1);
    assert_eq!(evicted, vec![0, 16, 32]);

    harness.wait_idle();
    assert_eq!(harness.handler.resident_chunks(), vec![39_984, 40_000, 40_016]);
    assert!(harness.handler.has_chunk(40_015));
}

/// Scrolling one chunk at a time only fetches the newly exposed chunk
#[test]
fn test_incremental_scroll_fetches_one_chunk() {
    let mut harness = HandlerHarness::new(16, sample_data(1024));
    harness.ensure_buffer(64, 1, 1);
    harness.wait_idle();
    assert_eq!(harness.gateway.request_count(), 3);

    let evicted = harness.ensure_buffer(80, 1, 1);
    assert_eq!(evicted, vec![48]);
    harness.wait_idle();

    assert_eq!(harness.gateway.request_count(), 4);
    assert_eq!(harness.handler.resident_chunks(), vec![64, 80, 96]);
}

/// After any ensure_buffer call nothing outside the window is resident
#[test]
fn test_nothing_outside_window_after_ensure_buffer() {
    let mut harness = HandlerHarness::new(8, sample_data(4096));
    harness.ensure_buffer(0, 0, 20);
    harness.wait_idle();
    let before = harness.handler.resident_chunks();

    let evicted = harness.ensure_buffer(100, 2, 3);
    let focal = harness.handler.chunk_start_for(100);
    let (low, high) = (focal - 2 * 8, focal + 3 * 8);

    for start in harness.handler.resident_chunks() {
        assert!(start >= low && start <= high, "chunk {} outside window", start);
    }
    for start in before {
        if start < low || start > high {
            assert!(evicted.contains(&start));
        }
    }
}
