//! Authentication and session lifecycle
//!
//! Email/password auth against the Discortize backend, plus the session
//! manager that keeps the access token silently renewed and tears the
//! session down when renewal is no longer possible.

pub mod account;
pub mod session;
pub mod store;

pub use account::{login, logout, register, status, whoami};
pub use session::{Navigator, ScreenNavigator, SessionManager};
pub use store::SessionStore;
