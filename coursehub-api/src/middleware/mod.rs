/// Middleware for the API server
///
/// - `security`: security response headers
/// - `guard`: moderator and admin route guards

pub mod guard;
pub mod security;
