pub mod password;
pub mod service;

pub use password::PasswordHasher;
pub use service::{UserPatch, UserService};
