//! AutoDub client library.
//!
//! Provides the REST wrapper for the dubbing service, the submission
//! controller, the single-slot polling engine, the historical job roster,
//! and a session type composing them for front ends.

pub mod api;
pub mod config;
pub mod events;
pub mod health;
pub mod poller;
pub mod roster;
pub mod service;
pub mod session;
pub mod submission;
