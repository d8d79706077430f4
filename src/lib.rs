//! Fundbridge — onboarding and proposal backend for the funding platform.

pub mod auth;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod proposals;
pub mod server;
pub mod store;
