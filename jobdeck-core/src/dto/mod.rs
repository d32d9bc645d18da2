//! Data Transfer Objects sent to the scheduling service
//!
//! Domain types describe what the service reports; DTOs describe what the
//! dashboard asks it to do.

pub mod job;
