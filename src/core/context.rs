//! Run-scoped context passed through the orchestration call chain.
//!
//! A [`RunContext`] is created when an orchestrator run starts and torn down
//! when it ends. It owns the run's logging span, the tool settings and the
//! optional workspace, and hands each component a [`ComponentContext`] built
//! from them. Nothing here is global: two runs in one process do not share
//! state.

use crate::config::settings::Settings;
use crate::core::component::ComponentContext;
use crate::workspace::Workspace;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    started: Instant,
    span: tracing::Span,
    settings: Settings,
    workspace: Option<Workspace>,
}

impl RunContext {
    /// Start a run. Mergers and runs without workspace access pass `None`.
    pub fn init(settings: Settings, workspace: Option<Workspace>) -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id);
        {
            let _guard = span.enter();
            match &workspace {
                Some(ws) => info!("Starting run with workspace {}", ws.base().display()),
                None => info!("Starting run without workspace"),
            }
        }
        Self {
            run_id,
            started: Instant::now(),
            span,
            settings,
            workspace,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    /// Build the context injected into the component named `identifier`.
    pub fn component(&self, identifier: &str) -> ComponentContext {
        let span = tracing::info_span!(parent: &self.span, "component", id = %identifier);
        let workspace = self.workspace.as_ref().map(|ws| ws.for_component(identifier));
        ComponentContext::new(identifier, span, workspace, self.settings.clone())
    }

    /// End the run, releasing the workspace handle.
    pub fn teardown(self) {
        let _guard = self.span.enter();
        info!("Run finished in {:.2?}", self.started.elapsed());
        if let Some(ws) = &self.workspace {
            debug!("Releasing workspace {}", ws.base().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_component_context_is_scoped() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::open(temp.path()).unwrap();
        let run = RunContext::init(Settings::default(), Some(workspace));

        let ctx = run.component("case_overview");
        assert_eq!(ctx.identifier(), "case_overview");
        let ws = ctx.workspace().unwrap();
        assert_eq!(ws.dir(), temp.path().join("case_overview"));

        run.teardown();
    }

    #[test]
    fn test_run_ids_are_unique() {
        let first = RunContext::init(Settings::default(), None);
        let second = RunContext::init(Settings::default(), None);
        assert_ne!(first.run_id(), second.run_id());
        assert!(first.component("gene_information_merger").workspace().is_none());
    }
}
