// ABOUTME: Validated domain types shared across the deploy pipeline.
// ABOUTME: Stack names, release ids, template references, parameters and remote ids.

mod id;
mod parameters;
mod release_id;
mod stack_name;
mod template_ref;

pub use id::{DistributionId, Id, InvalidationId};
pub use parameters::{ParametersError, StackParameters};
pub use release_id::{ReleaseId, ReleaseIdError};
pub use stack_name::{StackName, StackNameError};
pub use template_ref::TemplateRef;
