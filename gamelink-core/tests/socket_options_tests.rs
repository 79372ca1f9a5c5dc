//! Integration tests for endpoint options

use gamelink_core::prelude::*;
use std::time::Duration;

#[test]
fn test_builder_options() {
    let opts = EndpointOptions::new()
        .with_timeout(10)
        .with_nonblocking(true)
        .with_reuse_address(false)
        .with_backlog(32);

    assert_eq!(opts.timeout, Some(10));
    assert!(opts.nonblocking);
    assert!(!opts.reuse_address);
    assert_eq!(opts.backlog, 32);
    assert_eq!(opts.timeout_duration(), Some(Duration::from_secs(10)));
}

#[test]
fn test_default_values() {
    let opts = EndpointOptions::default();

    assert_eq!(opts.timeout, None); // platform default
    assert!(!opts.nonblocking);
    assert!(opts.reuse_address);
    assert_eq!(opts.effective_backlog(), DEFAULT_BACKLOG);
    assert_eq!(DEFAULT_TIMEOUT_SECS, 5);
    assert_eq!(DEFAULT_BUFFER_SIZE, 4096);
}

#[test]
fn test_backlog_applied_to_tcp_listener() {
    let port = portpicker::pick_unused_port().expect("no free port");
    let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();

    // A non-positive backlog still produces a working listener.
    let listener =
        Endpoint::create_listener(&addr, &EndpointOptions::new().with_backlog(0)).unwrap();
    let _client = Endpoint::connect(&addr).unwrap();
    assert!(listener.accept().is_ok());
}

#[test]
fn test_listener_options_applied_after_creation() {
    let port = portpicker::pick_unused_port().expect("no free port");
    let addr = Address::remote("127.0.0.1", u32::from(port)).unwrap();
    let opts = EndpointOptions::new().with_timeout(4).with_nonblocking(true);

    let listener = Endpoint::create_listener(&addr, &opts).unwrap();
    assert_eq!(listener.timeout(), Some(Duration::from_secs(4)));
    assert!(listener.is_nonblocking());
}
