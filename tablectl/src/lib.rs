//! Secondary policy-routing tables for multi-uplink hosts.
//!
//! A small, fixed pool of kernel routing tables is handed out to network interfaces. Routes,
//! source rules, fwmark rules (with their NAT masquerade) and per-UID marks are installed
//! against an interface's table by running `ip` and `iptables`, while per-table rule counts
//! decide when a table is released.
//!
//! ```rust,ignore
//! use tablectl::TableController;
//! use tablectl_exec::Runner;
//!
//! let mut ctl = TableController::new(Runner);
//! // ip route add 2001:db8::/64 dev wlan0 table 60
//! ctl.add_route("wlan0", "2001:db8::", 64, "::")?;
//! // ip rule add fwmark 60 table 60, then MASQUERADE for mark 60 out of wlan0
//! ctl.add_fwmark_rule("wlan0")?;
//! // mark packets owned by those UIDs with 60
//! ctl.add_uid_rule("wlan0", 10_000, 10_999)?;
//! ```
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod controller;
mod error;
mod fwmark;
mod options;
mod route;
mod rule;
mod shared;
mod slot;
mod uid_map;
mod uid_rule;

pub use controller::TableController;
pub use error::{Error, Response, ResponseCode, Result};
pub use options::ControllerOptions;
pub use route::UNSPECIFIED_GATEWAY;
pub use rule::ip_version;
pub use shared::SharedController;
pub use slot::{Action, InterfaceName, Slot, SlotRegistry};
pub use uid_map::{UidMarkEntry, UidMarkMap, UidMarkRegistry};

/// Number of interfaces that can own a secondary table at the same time.
pub const INTERFACES_TRACKED: usize = 10;

/// Table number of the first slot, clear of the tables the system reserves for itself.
pub const BASE_TABLE_NUMBER: u32 = 60;

/// Maximum stored length of an interface name.
pub const IFNAMSIZ: usize = 16;
