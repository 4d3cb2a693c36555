//! Background Tasks Module
//!
//! Tasks that run alongside an options holder.
//!
//! # Tasks
//! - Change listener: forwards option change notifications to a callback

mod listener;

pub use listener::spawn_change_listener;
