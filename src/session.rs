//! Session token newtype.
//!
//! Validates that the value is exactly 25 characters of lowercase ASCII
//! letters and digits, the shape of the tokens issued by the cloud save
//! service. Validation is purely lexical; whether the service accepts the
//! token is only known once the lookup runs.

use std::fmt;

use crate::error::{Result, SaveError};

/// Length of a session token.
pub const SESSION_TOKEN_LEN: usize = 25;

/// A lexically valid session token.
///
/// # Examples
///
/// ```
/// use phigros_save::session::SessionToken;
///
/// let token = SessionToken::try_from("abcdefghijklmnopqrstu1234").unwrap();
/// assert_eq!(token.as_str().len(), 25);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SessionToken {
    type Error = SaveError;

    fn try_from(value: &str) -> Result<Self> {
        validate_session_token(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SaveError;

    fn try_from(value: String) -> Result<Self> {
        validate_session_token(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of debug output and logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"<redacted>").finish()
    }
}

fn validate_session_token(value: &str) -> Result<()> {
    if value.len() != SESSION_TOKEN_LEN {
        return Err(SaveError::InvalidSessionFormat {
            reason: format!(
                "token must be {SESSION_TOKEN_LEN} characters, got {}",
                value.chars().count()
            ),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
    {
        return Err(SaveError::InvalidSessionFormat {
            reason: format!("unexpected character '{bad}'"),
        });
    }
    Ok(())
}
