//! Adapters - concrete implementations of the ports.

pub mod ai;
pub mod events;
pub mod image;
pub mod storage;
pub mod websocket;
