//! JSON bodies exchanged with the calendar server.

pub mod api;
