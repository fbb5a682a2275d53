//! # routerdesk-domain
//!
//! Pure domain model for the routerdesk edge-router administration system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Network value objects: MAC addresses, IPv4 address ranges
//! - Define **DHCP servers** with their **static mappings** and observed **leases**
//! - Compute **pool statistics** (pool size, leased, available, static)
//! - Define the singleton service settings: **DNS forwarding**, **DNS blacklist**
//!   and the **PPPoE server**
//! - Merge threat-feed networks into the **blocked network** list and diff it
//!   against the stored one
//! - Contain all invariant enforcement
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod net;
pub mod time;

pub mod blocklist;
pub mod dhcp;
pub mod forwarding;
pub mod pppoe;
pub mod service;
