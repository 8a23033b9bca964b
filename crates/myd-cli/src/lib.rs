//! Library side of the `transform-myd` binary: configuration, logging, the
//! JSON artifacts and the command pipeline.

pub mod artifacts;
pub mod config;
pub mod logging;
pub mod pipeline;
