//! Fathom→Pipedrive sync bridge: receives meeting-completion webhooks and
//! attaches a meeting note to every matching external contact in Pipedrive,
//! recording one audit row per attendee.

pub mod audit;
pub mod config;
pub mod model;
pub mod note;
pub mod payload;
pub mod pipedrive;
pub mod pipeline;
pub mod server;
