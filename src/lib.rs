//! Air Guitar Pro signaling server.
//!
//! A rendezvous and relay service for exactly two peers, a PC player and a
//! mobile controller, exchanging WebRTC negotiation messages and gameplay
//! events under a shared room identifier.

pub mod config;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod state;
pub mod token;
