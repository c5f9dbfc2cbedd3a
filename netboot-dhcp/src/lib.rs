//! Command-line support for acquiring a DHCP lease.
//!
//! The `netboot-dhcp` binary is a thin caller over `netboot-core`. This
//! library holds the pieces it needs that are worth testing on their own:
//!
//! - [`config`]: TOML settings with an embedded default
//! - [`modifiers`]: command-line flags turned into message modifiers
//! - [`reply`]: decoding of stored v4/v6 replies
//! - [`report`]: text rendering of configurations and conversations

pub mod config;
pub mod modifiers;
pub mod reply;
pub mod report;
