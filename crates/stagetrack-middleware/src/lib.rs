//! `stagetrack-middleware` – outbound position feed.
//!
//! Carries normalized positions from the tracker to the media engine without
//! caring what they mean.
//!
//! # Modules
//!
//! - [`wire`] – text datagram codec, `"0.531200 0.784500"`.
//! - [`publisher`] – the [`Publisher`] trait and [`UdpPublisher`], one
//!   connectionless datagram per emitted position.

pub mod publisher;
pub mod wire;

pub use publisher::{Publisher, UdpPublisher};
pub use wire::{decode_position, encode_position};
