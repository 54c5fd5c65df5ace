#![doc = include_str!("../README.md")]

mod config;
mod counter;
mod dispatcher;
mod entity;
mod error;
mod identity;
mod sink;
pub mod store;
mod task;

pub use crate::config::*;
pub use crate::counter::*;
pub use crate::dispatcher::*;
pub use crate::entity::*;
pub use crate::error::*;
pub use crate::identity::*;
pub use crate::sink::*;
pub use crate::task::*;
