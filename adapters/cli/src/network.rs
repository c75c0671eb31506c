//! Transport seam between the controller and the game server.

use std::{collections::VecDeque, fs, path::PathBuf};

use anyhow::{Context, Result};
use circles_core::{wire::ActionResponse, ActionRequest};
use tracing::debug;

/// Delivers requests to the server and hands back its answers.
pub trait NetworkClient {
    /// Sends one request.
    fn submit(&mut self, request: ActionRequest) -> Result<()>;

    /// Next answer from the server, if one is available.
    fn receive(&mut self) -> Result<Option<ActionResponse>>;
}

/// Network double that answers with prerecorded JSON documents.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    answers: VecDeque<PathBuf>,
    submitted: Vec<ActionRequest>,
}

impl ScriptedNetwork {
    /// Creates a network answering with the files in order.
    pub fn new(answers: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            submitted: Vec::new(),
        }
    }

    /// Requests sent so far.
    #[must_use]
    pub fn submitted(&self) -> &[ActionRequest] {
        &self.submitted
    }
}

impl NetworkClient for ScriptedNetwork {
    fn submit(&mut self, request: ActionRequest) -> Result<()> {
        debug!(action = %request.action, "request submitted");
        self.submitted.push(request);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<ActionResponse>> {
        let Some(path) = self.answers.pop_front() else {
            return Ok(None);
        };
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read response at {}", path.display()))?;
        let response = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse response at {}", path.display()))?;
        Ok(Some(response))
    }
}
