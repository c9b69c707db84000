//! Shared configuration types for the GodotBridge crates.

pub mod config;
