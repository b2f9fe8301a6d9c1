//! # rule-intel-cli
//!
//! Command-line front end for [`rule_intel`]: analysis and validation
//! commands, in-place rule editing, and the interaction log that records
//! edits.

pub mod cli;
pub mod edit;
pub mod logging;
pub mod memory;
