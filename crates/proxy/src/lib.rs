//! `gb-proxy`: HTTP front-end and CLI for the editor bridge.

pub mod api;
pub mod cli;
pub mod cors;
pub mod state;
