//! Wharf CLI — command surface over the image lifecycle engine.

pub mod commands;
pub mod output;
