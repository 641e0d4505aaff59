//! Trebek trivia bot — IRC transport, command dispatch, configuration and
//! HTTP status.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod irc;
pub mod logging;
pub mod routes;
pub mod state;
