pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod server;

pub use error::ApiError;
pub use server::{ApiState, build_api_router, start_api};
