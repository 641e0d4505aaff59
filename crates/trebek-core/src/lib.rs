//! Trebek Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the round
//! engine, the question sources, the score stores and the chat transport
//! depend on. It contains no infrastructure code.

pub mod chat;
pub mod clock;
pub mod error;
pub mod event;
pub mod question;
pub mod rng;
pub mod scoreboard;
