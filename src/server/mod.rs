mod catalog;
pub mod response;
mod router;
pub mod webhook;

pub use router::{AppState, create_router};
