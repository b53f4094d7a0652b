pub mod backend;
pub mod buffers;
pub mod context;
pub mod error;
pub mod layouts;
pub mod pipeline;
pub mod resources;
pub mod slots;
