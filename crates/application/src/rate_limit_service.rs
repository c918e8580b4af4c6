//! Rate limiting ports and application service.
//!
//! Implements a sliding-window limiter: each key keeps the timestamps of its
//! accepted requests inside the window, and a request is refused once the
//! window already holds the maximum. The store behind the port decides where
//! that state lives.

mod config;
mod ports;
mod service;

#[cfg(test)]
mod tests;

pub use config::RateLimitRule;
pub use ports::{AttemptInfo, RateLimitRepository};
pub use service::RateLimitService;
