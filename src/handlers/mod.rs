//! Request handlers, split by boundary.
//!
//! `api` speaks JSON and reports failures as status + JSON body.
//! `web`, `account` and `admin` serve page contexts and answer form posts
//! with `303` redirects carrying a flash message.

pub mod account;
pub mod admin;
pub mod api;
pub mod web;
