//! Failed endpoint creation must not leak descriptors.
//!
//! Kept in its own test binary: the descriptor count is process-wide, so no
//! other test may open sockets while it runs.

use gamelink_core::prelude::*;
use std::fs;

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn test_failed_creation_does_not_leak_descriptors() {
    let busy_port = portpicker::pick_unused_port().expect("no free port");
    let closed_port = portpicker::pick_unused_port().expect("no free port");
    let busy = Address::remote("127.0.0.1", u32::from(busy_port)).unwrap();
    let refused = Address::remote("127.0.0.1", u32::from(closed_port)).unwrap();
    let missing = Address::local(std::env::temp_dir().join(format!(
        "gamelink-fd-{}-missing.sock",
        std::process::id()
    )))
    .unwrap();
    let no_dir = Address::local("/nonexistent-gamelink-dir/listener.sock").unwrap();
    let no_reuse = EndpointOptions::default().with_reuse_address(false);

    let _holder = Endpoint::create_listener(&busy, &EndpointOptions::default()).unwrap();
    let before = open_descriptors();

    for _ in 0..32 {
        let err = Endpoint::create_listener(&busy, &no_reuse).unwrap_err();
        assert_eq!(err.step(), Some(Step::Bind));

        let err = Endpoint::create_listener(&no_dir, &EndpointOptions::default()).unwrap_err();
        assert_eq!(err.step(), Some(Step::Bind));

        let err = Endpoint::connect(&refused).unwrap_err();
        assert_eq!(err.step(), Some(Step::Connect));

        let err = Endpoint::connect(&missing).unwrap_err();
        assert_eq!(err.step(), Some(Step::Connect));
    }

    assert_eq!(open_descriptors(), before);
}
