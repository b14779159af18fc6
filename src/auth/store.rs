//! Session storage interface
//!
//! Every token read and write funnels through this trait so the three
//! storage keys (`token`, `refresh_token`, `user`) always move together.
//! A session is never half-authenticated: the token pair is written and
//! cleared as a unit.

use crate::models::User;

pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn user(&self) -> Option<User>;

    /// Write a full session after login or signup verification.
    fn store_login(&self, access_token: String, refresh_token: String, user: User);

    /// Overwrite the access token after a successful renewal. The refresh
    /// token and user record are replaced only when the backend sent new
    /// ones; otherwise the prior values remain valid.
    fn store_renewal(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        user: Option<User>,
    );

    /// Remove all three keys together. Partial removal is a bug.
    fn clear_session(&self);
}
