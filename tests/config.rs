// ABOUTME: Integration tests for configuration parsing and per-stack resolution.
// ABOUTME: Covers YAML parsing, validation failures, override precedence and stack variables.

mod support;

use stackship::config::*;
use stackship::diagnostics::{Diagnostics, WarningKind};
use stackship::error::Error;
use stackship::types::StackName;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn with_line_replaced(from: &str, to: &str) -> String {
    assert!(support::CONFIG_YAML.contains(from), "fixture has no '{from}'");
    support::CONFIG_YAML.replace(from, to)
}

mod parsing {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = DeployConfig::from_yaml(support::CONFIG_YAML).unwrap();

        let stack = StackName::new("prod").unwrap();
        assert_eq!(config.app_bucket_format.render(&stack), "prod-build");
        assert_eq!(config.static_bucket_format.render(&stack), "static-prod");
        assert_eq!(config.cfn_template_root_path, PathBuf::from("app/conf/cfn"));
        assert_eq!(config.nested_stack_templates, vec!["queue.json".to_string()]);
        assert_eq!(config.static_cache_max_age, Duration::from_secs(3600));
        assert_eq!(
            config
                .template_parameter_names
                .nested_parameter("queue.json"),
            Some("QueueTemplateURL")
        );
    }

    #[test]
    fn template_root_path_accepts_a_single_string() {
        let yaml = with_line_replaced(
            "cfn-template-root-path: [app, conf, cfn]",
            "cfn-template-root-path: templates",
        );
        let config = DeployConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.cfn_template_root_path, PathBuf::from("templates"));
    }

    #[test]
    fn printf_placeholder_is_accepted() {
        let yaml = with_line_replaced(
            r#"app-bucket-format: "{stack_name}-build""#,
            r#"app-bucket-format: "%(stack_name)s-build""#,
        );
        let config = DeployConfig::from_yaml(&yaml).unwrap();
        let stack = StackName::new("staging").unwrap();
        assert_eq!(config.app_bucket_format.render(&stack), "staging-build");
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let yaml = with_line_replaced("static-cache-max-age: 1h\n", "");
        let config = DeployConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.static_cache_max_age, Duration::from_secs(86_400));
        assert_eq!(config.setup_parameters.output_dir, PathBuf::from("dist"));
        assert!(config.db_migrator.is_none());
    }

    #[test]
    fn sample_config_parses() {
        let config = DeployConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        assert!(config.static_src_root.is_none());
        assert!(config.nested_stack_templates.is_empty());
    }
}

mod validation {
    use super::*;

    #[test]
    fn bucket_format_without_placeholder_is_rejected() {
        let yaml = with_line_replaced(
            r#"app-bucket-format: "{stack_name}-build""#,
            r#"app-bucket-format: "shared-build""#,
        );
        let err = DeployConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("stack_name"), "got: {err}");
    }

    #[test]
    fn nested_template_without_parameter_name_is_rejected() {
        let yaml = with_line_replaced(
            "nested-stack-templates: [queue.json]",
            "nested-stack-templates: [queue.json, cache.json]",
        );
        let err = DeployConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("cache.json")));
    }

    #[test]
    fn empty_path_segment_is_rejected() {
        let yaml = with_line_replaced(
            "cfn-template-root-path: [app, conf, cfn]",
            r#"cfn-template-root-path: [app, "", cfn]"#,
        );
        assert!(DeployConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let yaml = with_line_replaced("root-template-name: root.json\n", "");
        assert!(DeployConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let err = DeployConfig::load(Path::new("/nonexistent/deploy-config.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}

mod resolution {
    use super::*;

    fn write_stack_file(project: &Path, content: &str) {
        fs::write(project.join("scripts/stacks/prod-deploy.yaml"), content).unwrap();
    }

    #[test]
    fn global_values_apply_without_overrides() {
        let project = support::project();
        let resolved = support::resolved(project.path());

        assert_eq!(resolved.app_bucket, "prod-build");
        assert_eq!(resolved.static_bucket, "static-prod");
        assert_eq!(
            resolved.static_src_root.as_deref(),
            Some(project.path().join("static").as_path())
        );
        assert_eq!(
            resolved.root_template_path(),
            project.path().join("app/conf/cfn/root.json")
        );
        assert_eq!(resolved.static_cache_control(), "max-age=3600");
    }

    #[test]
    fn stack_file_overrides_global_and_cli_overrides_both() {
        let project = support::project();
        write_stack_file(
            project.path(),
            r#"
prod-vars:
  MinInstances: {value: 2, type: int}
overrides:
  db-migrator: django
  static-src-root: public
  static-cache-max-age: 5m
"#,
        );

        let from_file = support::resolved(project.path());
        assert_eq!(from_file.db_migrator.as_deref(), Some("django"));
        assert_eq!(
            from_file.static_src_root.as_deref(),
            Some(project.path().join("public").as_path())
        );
        assert_eq!(from_file.static_cache_control(), "max-age=300");

        let cli = CliOverrides {
            static_src_root: Some(PathBuf::from("assets")),
            db_migrator: Some("custom".to_string()),
        };
        let from_cli = support::resolved_with(project.path(), &cli);
        assert_eq!(from_cli.db_migrator.as_deref(), Some("custom"));
        assert_eq!(
            from_cli.static_src_root.as_deref(),
            Some(project.path().join("assets").as_path())
        );
    }

    #[test]
    fn missing_stack_file_is_a_warning() {
        let project = support::project();
        let config = DeployConfig::from_yaml(support::CONFIG_YAML).unwrap();
        let stack = StackName::new("staging").unwrap();
        let mut diag = Diagnostics::default();

        let resolved = config
            .resolve(&stack, project.path(), &CliOverrides::default(), &mut diag)
            .unwrap();

        assert!(resolved.stack_vars.is_empty());
        assert_eq!(diag.count(WarningKind::MissingStackVars), 1);
        assert!(diag.warnings()[0].message.contains("staging-deploy.yaml"));
    }

    #[test]
    fn stack_vars_are_rendered_by_type() {
        let project = support::project();
        write_stack_file(
            project.path(),
            r#"
prod-vars:
  DbInstanceClass: {value: db.t3.small, type: str}
  Title: {value: Shop, type: unicode}
  MinInstances: {value: 2, type: int}
  EnableCache: {value: true, type: bool}
  Untyped: {value: plain}
staging-vars:
  DbInstanceClass: {value: db.t3.micro, type: str}
"#,
        );

        let resolved = support::resolved(project.path());
        let vars = &resolved.stack_vars;
        assert_eq!(vars["DbInstanceClass"], "'db.t3.small'");
        assert_eq!(vars["Title"], "'Shop'");
        assert_eq!(vars["MinInstances"], "2");
        assert_eq!(vars["EnableCache"], "true");
        assert_eq!(vars["Untyped"], "'plain'");
        assert_eq!(vars.len(), 5);
    }

    #[test]
    fn malformed_stack_file_is_an_error() {
        let project = support::project();
        write_stack_file(project.path(), "overrides:\n  not-a-setting: 1\n");

        let config = DeployConfig::from_yaml(support::CONFIG_YAML).unwrap();
        let mut diag = Diagnostics::default();
        let err = config
            .resolve(
                &support::stack(),
                project.path(),
                &CliOverrides::default(),
                &mut diag,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}

mod content_types {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn configured_types_extend_the_defaults() {
        let extra = BTreeMap::from([(".webp".to_string(), "image/webp".to_string())]);
        let types = ContentTypes::with_overrides(&extra);

        assert_eq!(types.lookup(Path::new("img/a.webp")), Some("image/webp"));
        assert_eq!(types.lookup(Path::new("css/site.CSS")), Some("text/css"));
        assert_eq!(types.lookup(Path::new("notes.unknownext")), None);
    }
}
