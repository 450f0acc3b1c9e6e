pub mod catalog;
pub mod config;
pub mod director;
pub mod host;
pub mod pool;
pub mod session;
pub mod streamer;
pub mod window;
