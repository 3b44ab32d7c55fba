mod models;
mod payload;

pub use models::*;
pub use payload::*;
