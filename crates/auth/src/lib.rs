//! `flashweb-auth`: session and token authentication boundary.
//!
//! Decoupled from HTTP and storage: the guard talks to a token store, a
//! navigator and a token validator through traits, and the host decides what
//! those are (cookies and redirects in the web app, in-memory doubles in tests).

pub mod claims;
pub mod guard;
pub mod jwt;
pub mod navigation;
pub mod password;
pub mod roles;
pub mod session;
pub mod store;
pub mod user;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use guard::AuthGuard;
pub use jwt::{JwtService, MAX_EXPIRE_MINUTES, TokenOptions};
pub use navigation::{LOGIN_PATH, Navigator, RecordingNavigator};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::{Role, UnknownRole};
pub use session::UserSession;
pub use store::{InMemoryTokenStore, TOKEN_KEY, TokenStore, TokenStoreError};
pub use user::{NewUser, UserInfo};
pub use validator::{TokenServiceError, TokenValidator};
