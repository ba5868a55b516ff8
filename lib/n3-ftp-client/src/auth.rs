/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use thiserror::Error;

const USERNAME_MAX_LENGTH: usize = u8::MAX as usize;
const PASSWORD_MAX_LENGTH: usize = u8::MAX as usize;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CredentialParseError {
    #[error("too long string")]
    TooLong,
    #[error("control character is not allowed")]
    ControlCharacter,
}

fn check_no_control_chars(s: &str) -> Result<(), CredentialParseError> {
    // CR / LF / NUL in a credential would corrupt the command line
    if s.bytes().any(|b| b < 0x20 || b == 0x7f) {
        Err(CredentialParseError::ControlCharacter)
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Username {
    inner: String,
}

impl Username {
    pub fn empty() -> Self {
        Username {
            inner: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn from_original(s: &str) -> Result<Self, CredentialParseError> {
        if s.len() > USERNAME_MAX_LENGTH {
            return Err(CredentialParseError::TooLong);
        }
        check_no_control_chars(s)?;
        Ok(Username {
            inner: s.to_string(),
        })
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Password {
    inner: String,
}

impl Password {
    pub fn empty() -> Self {
        Password {
            inner: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn from_original(s: &str) -> Result<Self, CredentialParseError> {
        if s.len() > PASSWORD_MAX_LENGTH {
            return Err(CredentialParseError::TooLong);
        }
        check_no_control_chars(s)?;
        Ok(Password {
            inner: s.to_string(),
        })
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_control_chars() {
        assert!(Username::from_original("user\r\nQUIT").is_err());
        assert!(Password::from_original("pass\0word").is_err());
        assert!(Username::from_original("plain.user").is_ok());
    }

    #[test]
    fn reject_too_long() {
        let s = "a".repeat(256);
        assert_eq!(
            Username::from_original(&s),
            Err(CredentialParseError::TooLong)
        );
    }
}
