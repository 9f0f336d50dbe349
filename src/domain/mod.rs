//! Domain layer - session state and the request error taxonomy.

pub mod errors;
pub mod session;

pub use errors::ChatError;
pub use session::{Session, SessionId, Turn, TurnRole};
