//! Authentication core: token issuance/validation, password hashing,
//! session registry and the request middleware

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;

pub use jwt::{Claims, IssuedToken, JwtService};
pub use middleware::{auth_middleware, extract_token, AuthContext};
pub use password::PasswordHasher;
pub use session::SessionRegistry;
