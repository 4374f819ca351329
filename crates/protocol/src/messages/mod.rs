//! JSON message definitions.
//!
//! Client messages are decoded from inbound text frames; server messages are
//! built by the simulation loop and encoded once per broadcast.

mod client;
mod server;

pub use client::{ClientMessage, Join};
pub use server::{
    Eliminated, FoodView, PlayerView, RankEntry, ServerEvent, StateSnapshot, encode,
};
