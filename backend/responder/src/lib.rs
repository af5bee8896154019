pub mod providers;
pub mod responder;

pub use responder::{APOLOGY, Reply, Responder};
