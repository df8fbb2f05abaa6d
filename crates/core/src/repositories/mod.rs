//! Record collections.
//!
//! The patient store is the only collection with keyed, PIN-gated mutation. The others are
//! append-only lists with linear-scan filters.

pub mod alerts;
pub mod appointments;
pub mod facilities;
pub mod patients;
