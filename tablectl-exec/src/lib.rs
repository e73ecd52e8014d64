//! Running the external tools that change routing and firewall state, behind a trait that
//! tests can swap out.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod command;
mod recorder;

pub use command::{Error, Executor, Output, Runner};
pub use recorder::{DryRun, Recorder};
