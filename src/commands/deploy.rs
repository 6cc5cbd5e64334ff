// ABOUTME: Deploy command implementation.
// ABOUTME: Resolves config and identity, wires AWS backends, runs the deploy pipeline.

use stackship::cloud::aws::{AwsBackends, load_sdk_config};
use stackship::config::{CliOverrides, DeployConfig};
use stackship::deploy::{
    ApplyOutcome, Backends, DeploymentRequest, ReleaseAction, TemplateSource, run_deployment,
};
use stackship::diagnostics::Diagnostics;
use stackship::error::{Error, Result};
use stackship::migrate::MigratorRegistry;
use stackship::output::Output;
use stackship::package::TarballPackager;
use stackship::types::{ReleaseId, StackName, StackParameters};
use std::env;

use super::derive_identity;
use super::releases::print_listing;
use crate::cli::DeployArgs;

fn release_action(args: &DeployArgs) -> Result<ReleaseAction> {
    match (&args.revert_to_release_id, args.deploy_app) {
        (Some(id), _) => Ok(ReleaseAction::RevertTo(ReleaseId::new(id)?)),
        (None, true) => Ok(ReleaseAction::DeployApp),
        (None, false) => Err(Error::NothingToDo),
    }
}

fn deployment_request(args: &DeployArgs, action: ReleaseAction) -> Result<DeploymentRequest> {
    let template = match (&args.template, &args.template_url) {
        (_, Some(url)) => TemplateSource::Url(url.clone()),
        (Some(path), None) => TemplateSource::File(path.clone()),
        (None, None) => TemplateSource::Configured,
    };
    let parameters = match &args.parameters {
        Some(raw) => StackParameters::parse(raw)?,
        None => StackParameters::new(),
    };

    Ok(DeploymentRequest {
        action,
        dry_run: args.dry_run,
        include_static: !args.no_static,
        update_distro: args.update_distro,
        run_migrations: !args.no_db_migrations,
        allow_blessed_redeploy: args.allow_blessed_redeploy,
        template,
        parameters,
    })
}

pub async fn deploy(args: DeployArgs, mut output: Output) -> Result<()> {
    let action = release_action(&args)?;
    let stack = StackName::new(&args.stack_name)?;
    let request = deployment_request(&args, action)?;

    output.start_timer();
    let cwd = env::current_dir()?;
    let mut diag = Diagnostics::default();

    let config = DeployConfig::load(&cwd.join(&args.config_path))?;
    let overrides = CliOverrides {
        static_src_root: args.static_src_root.clone(),
        db_migrator: args.db_migrator.clone(),
    };
    let resolved = config.resolve(&stack, &cwd, &overrides, &mut diag)?;
    let identity = derive_identity(&args.identity, &cwd).await?;

    output.progress(&format!(
        "Deploying {} to stack {}",
        identity.release_id(),
        stack
    ));

    let sdk = load_sdk_config(None).await;
    let aws = AwsBackends::new(&sdk);
    let packager = TarballPackager::new(
        resolved.setup.output_dir.clone(),
        &resolved.setup.search_path_exclusions,
    );
    let migrators = MigratorRegistry::with_builtins(&cwd);
    let backends = Backends {
        store: &aws.store,
        stacks: &aws.stacks,
        edge: &aws.edge,
        packager: &packager,
        migrators: &migrators,
    };

    let report = run_deployment(&resolved, &identity, &request, &backends, &mut diag).await?;

    if let Some(listing) = &report.releases {
        print_listing(listing, &resolved.static_bucket, &output);
    }
    if let Some(upload) = &report.static_upload {
        output.progress(&format!(
            "Static release {}: {} file(s) uploaded, {} skipped",
            identity.release_id(),
            upload.keys.len(),
            upload.skipped
        ));
    }
    if let Some(app) = &report.app {
        output.progress(&format!("Application package: {}", app.artifact_url));
        let verb = match app.outcome {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Updated => "updated",
            ApplyOutcome::Planned { update: true } => "would update",
            ApplyOutcome::Planned { update: false } => "would create",
        };
        output.progress(&format!("Stack {stack} {verb}"));
    }
    if let Some(switch) = &report.switch {
        output.progress(&format!(
            "Distribution {} origin: {} -> /{}",
            switch.distribution,
            switch.previous_origin_path.as_deref().unwrap_or("-"),
            match &request.action {
                ReleaseAction::RevertTo(id) => id,
                ReleaseAction::DeployApp => identity.release_id(),
            }
        ));
    }

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.success(&format!("Deployment of {} complete", identity.release_id()));
    Ok(())
}
