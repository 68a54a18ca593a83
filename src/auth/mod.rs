//! Credentials and sessions: password rules, bcrypt hashing, and the
//! access / refresh token pair.

mod password;
mod token;

pub use password::*;
pub use token::*;
