pub mod formant;
pub mod metrics;
pub mod pitch;
pub mod roots;
pub mod stats;
