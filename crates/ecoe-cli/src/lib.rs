//! CLI library components for the ECOE question editor.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod render;
