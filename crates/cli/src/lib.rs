//! Terminal front end for the AutoDub client.
//!
//! [`commands`] drives a [`DubbingSession`](autodub_client::session::DubbingSession);
//! [`render`] turns engine events and roster views into printable lines.

pub mod commands;
pub mod render;
