/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the registration password policy
/// - [`jwt`]: HS256 session tokens and request authentication
/// - [`identity`]: local login, registration and OAuth account linking
/// - [`oauth`]: provider-neutral OAuth profile and the Google adapter
/// - [`authorization`]: the single ownership gate
/// - [`middleware`]: per-request auth context and bearer parsing
pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod password;
