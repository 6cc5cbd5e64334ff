// ABOUTME: Stack parameter assembly for the root template.
// ABOUTME: Live stack values, then caller values, then deployer-managed values.

use std::collections::BTreeMap;

use crate::config::TemplateParameterNames;
use crate::types::{ReleaseId, StackName, StackParameters};

pub const DEFAULT_RELEASE_NOTES: &str = "No release notes";

/// Values the deployer always sets, keyed by configured parameter names.
#[derive(Debug, Clone)]
pub struct SystemParameters<'a> {
    pub names: &'a TemplateParameterNames,
    pub artifact_url: &'a str,
    pub release_id: &'a ReleaseId,
    pub stack: &'a StackName,
    pub app_bucket: &'a str,
    /// Nested template file name and its URL.
    pub nested_templates: Vec<(&'a str, &'a str)>,
    /// Stack variables, already rendered.
    pub stack_vars: &'a BTreeMap<String, String>,
}

impl SystemParameters<'_> {
    pub fn to_parameters(&self) -> StackParameters {
        let names = self.names;
        let mut params = StackParameters::new();
        params.insert(&names.application_source_parameter_name, self.artifact_url);
        params.insert(&names.release_id_parameter_name, self.release_id.as_str());
        params.insert(&names.release_notes_parameter_name, DEFAULT_RELEASE_NOTES);
        params.insert(&names.root_stack_parameter_name, self.stack.as_str());
        params.insert(&names.app_bucket_parameter_name, self.app_bucket);
        params.insert(
            &names.app_bucket_arn_parameter_name,
            format!("arn:aws:s3:::{}/*", self.app_bucket),
        );

        for (template, url) in &self.nested_templates {
            match names.nested_parameter(template) {
                Some(name) => params.insert(name, *url),
                None => tracing::warn!(template, "no parameter name for nested template"),
            }
        }

        for (name, value) in self.stack_vars {
            params.insert(name, value);
        }
        params
    }
}

/// Merge parameter layers; later layers win.
pub fn merge_parameters(
    existing: Option<&StackParameters>,
    caller: &StackParameters,
    system: &StackParameters,
) -> StackParameters {
    let mut merged = existing.cloned().unwrap_or_default();
    merged.overlay(caller);
    merged.overlay(system);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> TemplateParameterNames {
        TemplateParameterNames {
            application_source_parameter_name: "ApplicationSource".to_string(),
            release_id_parameter_name: "ReleaseID".to_string(),
            release_notes_parameter_name: "ReleaseNotes".to_string(),
            root_stack_parameter_name: "RootStackName".to_string(),
            app_bucket_parameter_name: "BuildBucketName".to_string(),
            app_bucket_arn_parameter_name: "BuildBucketAccessArn".to_string(),
            nested_stack_parameter_names: BTreeMap::from([(
                "queue.json".to_string(),
                "QueueTemplateURL".to_string(),
            )]),
        }
    }

    #[test]
    fn system_parameters_cover_every_configured_name() {
        let names = names();
        let release = ReleaseId::new("acme-release-1.2.3").unwrap();
        let stack = StackName::new("prod").unwrap();
        let vars = BTreeMap::from([("DbClass".to_string(), "'db.t3.small'".to_string())]);
        let system = SystemParameters {
            names: &names,
            artifact_url: "https://prod-build.s3.amazonaws.com/app/acme.tar.gz",
            release_id: &release,
            stack: &stack,
            app_bucket: "prod-build",
            nested_templates: vec![("queue.json", "https://q")],
            stack_vars: &vars,
        }
        .to_parameters();

        assert_eq!(system.get("ReleaseID"), Some("acme-release-1.2.3"));
        assert_eq!(system.get("ReleaseNotes"), Some("No release notes"));
        assert_eq!(system.get("RootStackName"), Some("prod"));
        assert_eq!(
            system.get("BuildBucketAccessArn"),
            Some("arn:aws:s3:::prod-build/*")
        );
        assert_eq!(system.get("QueueTemplateURL"), Some("https://q"));
        assert_eq!(system.get("DbClass"), Some("'db.t3.small'"));
    }

    #[test]
    fn later_layers_win() {
        let existing = StackParameters::parse("A=live;B=live;C=live").unwrap();
        let caller = StackParameters::parse("B=caller;C=caller").unwrap();
        let system = StackParameters::parse("C=system").unwrap();

        let merged = merge_parameters(Some(&existing), &caller, &system);

        assert_eq!(merged.get("A"), Some("live"));
        assert_eq!(merged.get("B"), Some("caller"));
        assert_eq!(merged.get("C"), Some("system"));
    }
}
