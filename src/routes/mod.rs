//! Router Module Index
//!
//! Routes are grouped by audience so the admin gate is applied once, at the
//! module boundary, instead of being remembered per route.

/// Site pages open to everyone.
pub mod public;

/// Sign-in, sign-up, profile and event registration.
pub mod authenticated;

/// Back-office under `/admin`, wrapped in `access::admin_gate`.
pub mod admin;

/// JSON REST API under `/api`.
pub mod api;
