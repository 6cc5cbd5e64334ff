// ABOUTME: Reference to an infrastructure template, by URL or inline body.
// ABOUTME: Uploaded templates are referenced by URL; dry runs validate local bodies.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// Template stored in object storage.
    Url(String),
    /// Template text read from disk, used when nothing is uploaded.
    Body(String),
}

impl TemplateRef {
    pub fn url(&self) -> Option<&str> {
        match self {
            TemplateRef::Url(url) => Some(url),
            TemplateRef::Body(_) => None,
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Url(url) => f.write_str(url),
            TemplateRef::Body(body) => write!(f, "<inline template, {} bytes>", body.len()),
        }
    }
}
