//! Jobdeck Core
//!
//! Core types and derived behaviors for the Jobdeck scheduler dashboard.
//!
//! This crate contains:
//! - Domain types: jobs as served by the scheduling service (trigger, status, request, result)
//! - DTOs: payloads sent back to the scheduling service
//! - Time math and the adaptive countdown engine
//! - The job form validator and the collection view helpers used by front ends

pub mod countdown;
pub mod domain;
pub mod dto;
pub mod error;
pub mod form;
pub mod time;
pub mod view;

pub use error::{Error, Result};
