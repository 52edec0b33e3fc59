//! Fault-ticket assembly and sealing.
//!
//! A verification ends here: the assembler folds the feed responses, the
//! matcher output and the detector verdict into one [`FaultTicket`], stamps
//! the legal citations and seals the record with a canonical SHA-256 digest.

pub mod assembler;
pub mod hash;
pub mod types;

pub use assembler::{TicketInput, TicketSeed, create_fault_ticket};
pub use hash::{HashSubset, Sha256Hasher, TicketHasher};
pub use types::{
    ALGORITHM_VERSION, Confidence, FaultTicket, IncidentKind, SCHEMA_VERSION, StationData,
    UserGps, Verdict,
};
