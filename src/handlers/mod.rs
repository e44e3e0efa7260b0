//! Request handlers.

pub mod connection;
pub mod relay;
pub mod room;
