//! SIRI Stop-Monitoring extraction.
//!
//! [`extract`] does raw tag/block scanning over feed XML; [`visit`] turns
//! visit fragments into typed [`StopVisit`] records with a
//! missing-field-means-empty contract.

pub mod extract;
pub mod visit;

pub use extract::{extract_blocks, extract_tag};
pub use visit::{StopVisit, parse_feed_xml, parse_stop_visit};
