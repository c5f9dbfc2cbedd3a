use std::cell::Cell;
use std::time::{Duration, Instant};

use netboot_core::{wait_until_up, IfUpError, IfUpOptions, Interface, InterfaceQuery};

/// Interface that reports down for the first `down_for` lookups.
struct FlakyLink {
    down_for: usize,
    lookups: Cell<usize>,
}

impl FlakyLink {
    fn new(down_for: usize) -> Self {
        Self {
            down_for,
            lookups: Cell::new(0),
        }
    }
}

impl InterfaceQuery for FlakyLink {
    fn lookup(&self, name: &str) -> Result<Interface, IfUpError> {
        let n = self.lookups.get();
        self.lookups.set(n + 1);
        Ok(Interface::new(name, Some([2, 0, 0, 0, 0, 1]), n >= self.down_for))
    }
}

struct NoSuchInterface {
    lookups: Cell<usize>,
}

impl InterfaceQuery for NoSuchInterface {
    fn lookup(&self, name: &str) -> Result<Interface, IfUpError> {
        self.lookups.set(self.lookups.get() + 1);
        Err(IfUpError::NotFound {
            name: name.to_string(),
        })
    }
}

fn options(timeout_ms: u64, poll_ms: u64) -> IfUpOptions {
    IfUpOptions {
        timeout: Duration::from_millis(timeout_ms),
        poll_interval: Duration::from_millis(poll_ms),
    }
}

#[test]
fn already_up_returns_without_sleeping() {
    let link = FlakyLink::new(0);
    let start = Instant::now();

    let iface = wait_until_up(&link, "eth0", &options(5_000, 1_000)).expect("up");

    assert!(iface.is_up());
    assert_eq!(iface.name(), "eth0");
    assert_eq!(link.lookups.get(), 1);
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn missing_interface_fails_on_first_lookup() {
    let query = NoSuchInterface {
        lookups: Cell::new(0),
    };
    let start = Instant::now();

    let err = wait_until_up(&query, "nope0", &options(5_000, 100)).expect_err("not found");

    assert!(matches!(err, IfUpError::NotFound { ref name } if name == "nope0"));
    assert_eq!(query.lookups.get(), 1);
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn link_coming_up_is_seen_on_a_later_poll() {
    let link = FlakyLink::new(3);

    let iface = wait_until_up(&link, "eth1", &options(5_000, 5)).expect("up");

    assert!(iface.is_up());
    assert_eq!(link.lookups.get(), 4);
}

#[test]
fn link_that_stays_down_times_out_naming_the_interface() {
    let link = FlakyLink::new(usize::MAX);
    let start = Instant::now();

    let err = wait_until_up(&link, "eth2", &options(50, 10)).expect_err("stays down");

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(matches!(err, IfUpError::Timeout { .. }));
    assert_eq!(err.to_string(), "timed out while waiting for eth2 to come up");
}

#[test]
fn poll_sleep_never_overshoots_the_timeout() {
    let link = FlakyLink::new(usize::MAX);
    let start = Instant::now();

    let _ = wait_until_up(&link, "eth3", &options(40, 10_000));

    assert!(start.elapsed() < Duration::from_secs(2));
}
