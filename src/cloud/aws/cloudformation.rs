// ABOUTME: CloudFormation-backed stack orchestrator.
// ABOUTME: Maps stack requests to create/update/validate calls and reads live parameters.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{
    Capability as CfnCapability, OnFailure as CfnOnFailure, Parameter,
};

use super::is_access_denied_code;
use crate::cloud::{Capability, OnFailure, StackError, StackOrchestrator, StackRequest};
use crate::types::{StackName, StackParameters, TemplateRef};

#[derive(Debug, Clone)]
pub struct CloudFormationStacks {
    client: Client,
}

impl CloudFormationStacks {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

// =============================================================================
// Conversions and error mapping
// =============================================================================

fn message<E>(error: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(error).to_string())
}

fn map_operation_error<E>(error: &E, stack: &StackName, operation: &'static str) -> StackError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    if is_access_denied_code(error.code()) {
        return StackError::AccessDenied(message(error));
    }
    StackError::OperationFailed {
        stack: stack.to_string(),
        operation,
        message: message(error),
    }
}

fn to_parameters(parameters: &StackParameters) -> Vec<Parameter> {
    parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn to_capability(capability: Capability) -> CfnCapability {
    match capability {
        Capability::Iam => CfnCapability::CapabilityIam,
        Capability::NamedIam => CfnCapability::CapabilityNamedIam,
    }
}

fn to_on_failure(on_failure: OnFailure) -> CfnOnFailure {
    match on_failure {
        OnFailure::DoNothing => CfnOnFailure::DoNothing,
        OnFailure::Rollback => CfnOnFailure::Rollback,
        OnFailure::Delete => CfnOnFailure::Delete,
    }
}

fn split_template(template: &TemplateRef) -> (Option<String>, Option<String>) {
    match template {
        TemplateRef::Url(url) => (Some(url.clone()), None),
        TemplateRef::Body(body) => (None, Some(body.clone())),
    }
}

#[async_trait]
impl StackOrchestrator for CloudFormationStacks {
    async fn describe_stack(
        &self,
        stack: &StackName,
    ) -> Result<Option<StackParameters>, StackError> {
        let output = match self
            .client
            .describe_stacks()
            .stack_name(stack.as_str())
            .send()
            .await
        {
            Ok(output) => output,
            Err(e)
                if e.code() == Some("ValidationError")
                    && e.message().is_some_and(|m| m.contains("does not exist")) =>
            {
                return Ok(None);
            }
            Err(e) if is_access_denied_code(e.code()) => {
                return Err(StackError::AccessDenied(message(&e)));
            }
            Err(e) => return Err(StackError::Api(message(&e))),
        };

        Ok(output.stacks().first().map(|s| {
            s.parameters()
                .iter()
                .filter_map(|p| Some((p.parameter_key()?, p.parameter_value().unwrap_or(""))))
                .collect()
        }))
    }

    async fn create_stack(
        &self,
        request: &StackRequest,
        on_failure: OnFailure,
    ) -> Result<(), StackError> {
        let (url, body) = split_template(&request.template);
        let output = self
            .client
            .create_stack()
            .stack_name(request.stack.as_str())
            .set_template_url(url)
            .set_template_body(body)
            .set_parameters(Some(to_parameters(&request.parameters)))
            .set_capabilities(Some(
                request.capabilities.iter().copied().map(to_capability).collect(),
            ))
            .on_failure(to_on_failure(on_failure))
            .send()
            .await
            .map_err(|e| map_operation_error(&e, &request.stack, "create"))?;

        tracing::info!(
            stack = %request.stack,
            stack_id = output.stack_id().unwrap_or("-"),
            "stack creation started"
        );
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), StackError> {
        let (url, body) = split_template(&request.template);
        let output = self
            .client
            .update_stack()
            .stack_name(request.stack.as_str())
            .use_previous_template(false)
            .set_template_url(url)
            .set_template_body(body)
            .set_parameters(Some(to_parameters(&request.parameters)))
            .set_capabilities(Some(
                request.capabilities.iter().copied().map(to_capability).collect(),
            ))
            .send()
            .await
            .map_err(|e| map_operation_error(&e, &request.stack, "update"))?;

        tracing::info!(
            stack = %request.stack,
            stack_id = output.stack_id().unwrap_or("-"),
            "stack update started"
        );
        Ok(())
    }

    async fn validate_template(&self, template: &TemplateRef) -> Result<(), StackError> {
        let (url, body) = split_template(template);
        self.client
            .validate_template()
            .set_template_url(url)
            .set_template_body(body)
            .send()
            .await
            .map_err(|e| match e.code() {
                code if is_access_denied_code(code) => StackError::AccessDenied(message(&e)),
                Some("ValidationError") => StackError::InvalidTemplate(message(&e)),
                _ => StackError::Api(message(&e)),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_keep_names_and_values() {
        let params = StackParameters::parse("A=1;B=x=y").unwrap();
        let converted = to_parameters(&params);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[1].parameter_key(), Some("B"));
        assert_eq!(converted[1].parameter_value(), Some("x=y"));
    }

    #[test]
    fn template_reference_selects_one_field() {
        let (url, body) = split_template(&TemplateRef::Url("https://b/t.yaml".to_string()));
        assert_eq!(url.as_deref(), Some("https://b/t.yaml"));
        assert!(body.is_none());
    }
}
