//! zonetrace - Call-stack zone analyzer
//!
//! Given a captured call stack and a set of named code zones (logical
//! subsystems identified by type/module prefixes, optionally composed of
//! other zones), zonetrace reports the chronological points where execution
//! entered each zone and where it finally left all of them. Test harnesses use
//! it at the moment an assertion fails to tell which subsystem was running.

pub mod analysis;
pub mod analyzer;
pub mod capture;
pub mod cli;
pub mod error;
pub mod frame;
pub mod report;
pub mod trace_parser;
pub mod zone;
