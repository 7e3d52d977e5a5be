//! Flash notifications for actix-web: queue short-lived messages in the
//! session and render them into the next response.

pub mod core;
pub mod web;
