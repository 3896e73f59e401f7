pub mod data;
pub mod sampler;
pub mod session;
