use regex::Regex;
use std::sync::LazyLock;

use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 8;

pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters long";
pub const PASSWORD_TOO_WEAK: &str = "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character";
pub const INVALID_EMAIL: &str = "Invalid email format";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn validate_email(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(Error::invalid(INVALID_EMAIL))
    }
}

/// At least one upper case letter, one lower case letter, one digit and one
/// character that is none of those.
pub fn is_strong_password(password: &str) -> bool {
    let mut upper = false;
    let mut lower = false;
    let mut digit = false;
    let mut symbol = false;
    for c in password.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else if !c.is_alphanumeric() && !c.is_whitespace() {
            symbol = true;
        }
    }
    upper && lower && digit && symbol
}

/// Length is checked before strength so that a short password always gets
/// the length message.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::invalid(PASSWORD_TOO_SHORT));
    }
    if !is_strong_password(password) {
        return Err(Error::invalid(PASSWORD_TOO_WEAK));
    }
    Ok(())
}

/// bcrypt with a fixed work factor. Hashing runs on the blocking pool.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let cost = self.cost;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| Error::internal(format!("password hashing task failed: {e}")))?
            .map_err(|e| Error::internal(format!("password hashing failed: {e}")))
    }

    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| Error::internal(format!("password verification task failed: {e}")))?;
        match verified {
            Ok(ok) => Ok(ok),
            Err(err) => {
                tracing::warn!(error = %err, "stored password hash could not be verified");
                Ok(false)
            }
        }
    }
}
