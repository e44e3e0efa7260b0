//! Wire protocol: message vocabulary and room identifier rules.

pub mod messages;
pub mod room_id;

pub use messages::*;
