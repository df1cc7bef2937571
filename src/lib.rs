//! Task Quest Library
//!
//! A task list with experience points, levels, and badges. The task store and
//! progression engine are plain values; `Session` ties them to storage and
//! turns each user action into an ordered batch of reward events.

pub mod badges;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod logging;
pub mod persistence;
pub mod progression;
pub mod session;
pub mod store;
pub mod types;
