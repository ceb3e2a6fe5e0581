/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Access/refresh token issuing and validation
/// - [`middleware`]: Bearer-token authentication and the `AuthContext` extractor
/// - [`guard`]: Route guards for admin and moderation areas
/// - [`authorization`]: Role and ownership checks inside handlers
///
/// # Example
///
/// ```no_run
/// use coursehub_shared::auth::password::{hash_password, verify_password};
/// use coursehub_shared::auth::jwt::issue_token_pair;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("learn-rust-2024")?;
/// assert!(verify_password("learn-rust-2024", &hash)?);
///
/// let tokens = issue_token_pair(Uuid::new_v4(), "an-application-secret-of-32-bytes!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
