pub mod buffers;
pub mod core;
pub mod engine;
pub mod hal;
pub mod observability;
