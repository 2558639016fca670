//! Campus Subscriptions - student subscription payments.
//!
//! Collects mobile-money subscription payments through Nkwa Pay, reconciles
//! signed provider webhooks into a transaction ledger and student subscription
//! state, and enforces one student record per (faculty, matricule).

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
