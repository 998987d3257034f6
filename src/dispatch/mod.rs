//! # Dispatch Module
//!
//! Input-to-command core.
//!
//! Each cycle the [`dispatcher::Dispatcher`] reads the latest controller
//! snapshot, resolves discrete actions through the binding table and the
//! edge tracker, maps analog axes to motion, and emits the commands the
//! rate governor allows.

pub mod bindings;
pub mod command;
pub mod dispatcher;
pub mod governor;
pub mod latch;

pub use command::{Command, PtzCamera};
pub use dispatcher::{Dispatcher, DispatcherSettings, PowerState};
