//! idle-reaper - policy-governed shutdown of idle AWS resources
//!
//! Scans compute, database, container, network, storage, and search
//! resources across regions, decides which are old enough and unprotected,
//! orders them by cost impact, gates execution against a schedule, and
//! executes stop/delete actions with per-resource fault isolation.
//!
//! ## Layout
//!
//! The decision/execution engine ([`coordinator`], [`executor`],
//! [`protection`], [`eligibility`], [`cost`], [`prioritize`], [`schedule`])
//! is cloud-agnostic and talks to providers only through the seams in
//! [`cloud`]. The [`aws`] module implements those seams with the service
//! SDKs.

pub mod aws;
pub mod cloud;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod cost;
pub mod eligibility;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod pattern;
pub mod prioritize;
pub mod protection;
pub mod report;
pub mod resource;
pub mod schedule;
pub mod summary;
pub mod tags;
