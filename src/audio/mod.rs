pub mod analyser;
pub mod decode;
pub mod frame;
pub mod source;
