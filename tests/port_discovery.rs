//! Port probing and the reusable listener.

use std::net::SocketAddr;

use static_preview::net::{find_free_port, ReusableListener};
use static_preview::BindError;

mod common;

use common::LOCALHOST;

#[test]
fn free_start_port_is_returned_unchanged() {
    let base = common::free_port_block(1);
    assert_eq!(find_free_port(LOCALHOST, base, 10), Some(base));
}

#[test]
fn occupied_start_port_is_skipped() {
    let (base, mut held) = common::hold_port_block(3);
    held.truncate(1);

    assert_eq!(find_free_port(LOCALHOST, base, 10), Some(base + 1));
}

#[test]
fn first_free_port_in_range_wins() {
    let (base, mut held) = common::hold_port_block(5);
    // base..base+2 stay busy, base+3 and base+4 are released.
    held.truncate(3);

    assert_eq!(find_free_port(LOCALHOST, base, 10), Some(base + 3));
}

#[test]
fn exhausted_range_finds_nothing() {
    let (base, _held) = common::hold_port_block(10);
    assert_eq!(find_free_port(LOCALHOST, base, 10), None);
}

#[tokio::test]
async fn real_bind_reports_address_in_use() {
    let (base, _held) = common::hold_port_block(1);
    let addr = SocketAddr::new(LOCALHOST, base);

    let err = ReusableListener::bind(addr).unwrap_err();
    assert!(
        matches!(err, BindError::AddressInUse { addr: a } if a == addr),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn other_bind_failures_are_not_address_in_use() {
    // TEST-NET-3, never assigned to a local interface.
    let addr: SocketAddr = "203.0.113.7:8000".parse().unwrap();

    let err = ReusableListener::bind(addr).unwrap_err();
    assert!(matches!(err, BindError::Os { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn port_can_be_rebound_right_after_release() {
    let listener = ReusableListener::bind(SocketAddr::new(LOCALHOST, 0)).unwrap();
    let addr = listener.local_addr();
    drop(listener);

    let again = ReusableListener::bind(addr).unwrap();
    assert_eq!(again.local_addr(), addr);
}
