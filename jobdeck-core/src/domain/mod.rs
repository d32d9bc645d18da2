//! Core domain types
//!
//! This module contains the job structures as served by the scheduling
//! service. These types are the read side of the dashboard: they are only
//! ever replaced by a fresh fetch, never patched locally.

pub mod job;
