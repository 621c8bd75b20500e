//! CLI library components for aecdata.

pub mod logging;
pub mod pipeline;
