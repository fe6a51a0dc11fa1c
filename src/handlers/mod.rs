pub mod health;
pub mod rpc;
pub mod sse;

pub use health::{health_handler, ready_handler};
pub use rpc::rpc_handler;
pub use sse::sse_handler;
