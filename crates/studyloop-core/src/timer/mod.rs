mod config;
mod engine;

pub use config::{Phase, TimerConfig};
pub use engine::TimerEngine;
