// ABOUTME: Infrastructure stack orchestration operations.
// ABOUTME: Describe, create, update and validate declarative stack templates.

use async_trait::async_trait;
use std::fmt;

use crate::types::{StackName, StackParameters, TemplateRef};

/// What the orchestrator does when stack creation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Leave the failed stack in place for inspection.
    DoNothing,
    Rollback,
    Delete,
}

impl fmt::Display for OnFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnFailure::DoNothing => "DO_NOTHING",
            OnFailure::Rollback => "ROLLBACK",
            OnFailure::Delete => "DELETE",
        })
    }
}

/// Capabilities acknowledged on create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Iam,
    NamedIam,
}

/// Create or update request for one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRequest {
    pub stack: StackName,
    pub template: TemplateRef,
    pub parameters: StackParameters,
    pub capabilities: Vec<Capability>,
}

/// Stack lifecycle operations.
#[async_trait]
pub trait StackOrchestrator: Send + Sync {
    /// Current parameters of a live stack, or `None` if it does not exist.
    async fn describe_stack(&self, stack: &StackName)
    -> Result<Option<StackParameters>, StackError>;

    async fn create_stack(&self, request: &StackRequest, on_failure: OnFailure)
    -> Result<(), StackError>;

    /// Update with the given template; never reuses the previous template.
    async fn update_stack(&self, request: &StackRequest) -> Result<(), StackError>;

    /// Check a template without touching any stack.
    async fn validate_template(&self, template: &TemplateRef) -> Result<(), StackError>;
}

/// Errors from stack orchestration.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("template is invalid: {0}")]
    InvalidTemplate(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("stack {stack} {operation} failed: {message}")]
    OperationFailed {
        stack: String,
        operation: &'static str,
        message: String,
    },

    #[error("stack orchestrator error: {0}")]
    Api(String),
}

impl StackError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, StackError::AccessDenied(_))
    }
}
