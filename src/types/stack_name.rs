// ABOUTME: Validated infrastructure stack name.
// ABOUTME: Enforces CloudFormation naming rules before any remote call is made.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StackNameError {
    #[error("stack name cannot be empty")]
    Empty,

    #[error("stack name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("stack name must start with a letter")]
    MustStartWithLetter,

    #[error("invalid character in stack name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackName(String);

impl StackName {
    pub fn new(value: &str) -> Result<Self, StackNameError> {
        let first = value.chars().next().ok_or(StackNameError::Empty)?;

        if value.len() > 128 {
            return Err(StackNameError::TooLong);
        }

        if !first.is_ascii_alphabetic() {
            return Err(StackNameError::MustStartWithLetter);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(StackNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StackName {
    type Err = StackNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
