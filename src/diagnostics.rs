// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A static file skipped because no content type is configured for it.
    pub fn skipped_static_file(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SkippedStaticFile,
            message: message.into(),
        }
    }

    pub fn missing_stack_vars(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MissingStackVars,
            message: message.into(),
        }
    }

    pub fn distro_update_ignored(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DistroUpdateIgnored,
            message: message.into(),
        }
    }

    /// A redeployed blessed release whose static files were already uploaded.
    pub fn static_release_kept(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StaticReleaseKept,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Static file with an unknown extension was not uploaded.
    SkippedStaticFile,
    /// Stack variables file was configured but not found.
    MissingStackVars,
    /// Distribution update requested without static content.
    DistroUpdateIgnored,
    /// Static release left as is during an allowed blessed redeploy.
    StaticReleaseKept,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::skipped_static_file("skipping upload of app.wasm"));
        diag.warn(Warning::missing_stack_vars("no scripts/stacks/prod-deploy.yaml"));
        diag.warn(Warning::skipped_static_file("skipping upload of README"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 3);
        assert_eq!(diag.count(WarningKind::SkippedStaticFile), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        let skipped = Warning::skipped_static_file("test");
        assert_eq!(skipped.kind, WarningKind::SkippedStaticFile);

        let ignored = Warning::distro_update_ignored("test");
        assert_eq!(ignored.kind, WarningKind::DistroUpdateIgnored);

        let kept = Warning::static_release_kept("test");
        assert_eq!(kept.kind, WarningKind::StaticReleaseKept);
    }
}
