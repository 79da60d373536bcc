//! Shared building blocks: nalgebra math aliases and `env_logger` setup

pub mod math;
pub mod logging;
