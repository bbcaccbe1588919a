//! Access token model, placement options, and redacted secrets.

pub mod access;
pub mod options;
pub mod secret;
