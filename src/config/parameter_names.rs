// ABOUTME: Names of the stack parameters the deployer fills in.
// ABOUTME: Validated at load so every nested template has a parameter to receive its URL.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemplateParameterNames {
    pub application_source_parameter_name: String,
    pub release_id_parameter_name: String,
    pub release_notes_parameter_name: String,
    pub root_stack_parameter_name: String,
    pub app_bucket_parameter_name: String,
    #[serde(rename = "app-bucket-arn-param-name")]
    pub app_bucket_arn_parameter_name: String,
    /// Nested template file name to the parameter receiving its URL.
    #[serde(rename = "nested-stack-param-name-dict", default)]
    pub nested_stack_parameter_names: BTreeMap<String, String>,
}

impl TemplateParameterNames {
    pub fn validate(&self, nested_templates: &[String]) -> Result<()> {
        let required = [
            (
                "application-source-parameter-name",
                &self.application_source_parameter_name,
            ),
            ("release-id-parameter-name", &self.release_id_parameter_name),
            (
                "release-notes-parameter-name",
                &self.release_notes_parameter_name,
            ),
            ("root-stack-parameter-name", &self.root_stack_parameter_name),
            ("app-bucket-parameter-name", &self.app_bucket_parameter_name),
            ("app-bucket-arn-param-name", &self.app_bucket_arn_parameter_name),
        ];
        if let Some((key, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "template-parameter-names.{key} must not be empty"
            )));
        }

        let missing: Vec<&str> = nested_templates
            .iter()
            .filter(|t| !self.nested_stack_parameter_names.contains_key(t.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "template-parameter-names.nested-stack-param-name-dict has no entry for: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Parameter receiving the URL of `template`.
    pub fn nested_parameter(&self, template: &str) -> Option<&str> {
        self.nested_stack_parameter_names
            .get(template)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> TemplateParameterNames {
        serde_yaml::from_str(
            r#"
application-source-parameter-name: ApplicationSource
release-id-parameter-name: ReleaseID
release-notes-parameter-name: ReleaseNotes
root-stack-parameter-name: RootStackName
app-bucket-parameter-name: BuildBucketName
app-bucket-arn-param-name: BuildBucketAccessArn
nested-stack-param-name-dict:
  queue.json: QueueTemplateURL
"#,
        )
        .unwrap()
    }

    #[test]
    fn every_nested_template_needs_a_mapping() {
        let names = names();
        assert!(names.validate(&["queue.json".to_string()]).is_ok());

        let err = names
            .validate(&["queue.json".to_string(), "cache.json".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("cache.json"));
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut names = names();
        names.release_id_parameter_name = " ".to_string();
        let err = names.validate(&[]).unwrap_err();
        assert!(err.to_string().contains("release-id-parameter-name"));
    }
}
