//! Domain types for the AutoDub client.
//!
//! Pure data and validation with no I/O: the job snapshot model, dub
//! request validation, and roster ordering/display rules. The HTTP
//! layer and polling engine live in `autodub-client`.

pub mod error;
pub mod job;
pub mod roster;
pub mod submission;
pub mod types;
