//! Test doubles shared by unit tests

use crate::client::{ExplainRequest, Transport};
use crate::error::{AuditDogResult, ExplainError};
use crate::explanation::ExplanationRecord;
use crate::session::CommandRunner;
use crate::ui::Prompter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const HIGH_RISK_BODY: &str = r#"{
    "command": "rm -rf /tmp/x",
    "summary": "Recursively deletes /tmp/x",
    "risk_level": "high",
    "sections": [{"title": "Effect", "content": "Everything under /tmp/x is removed"}]
}"#;

pub fn high_risk_record() -> ExplanationRecord {
    ExplanationRecord::from_response(HIGH_RISK_BODY).unwrap()
}

pub fn refused() -> Result<String, ExplainError> {
    Err(ExplainError::Transport("connection refused".to_string()))
}

/// Plays back canned results, one per request
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<String, ExplainError>>>>,
    requests: Arc<Mutex<Vec<ExplainRequest>>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String, ExplainError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ExplainRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ExplainRequest) -> Result<String, ExplainError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(refused)
    }
}

/// Answers prompts from a script; `None` means the user just hit Enter
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    answers: Arc<Mutex<VecDeque<Option<bool>>>>,
    asked: Arc<Mutex<Vec<(String, bool)>>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Option<bool>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            asked: Arc::default(),
        }
    }

    /// Questions asked so far with their defaults
    pub fn asked(&self) -> Vec<(String, bool)> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, message: &str, default: bool) -> AuditDogResult<bool> {
        self.asked
            .lock()
            .unwrap()
            .push((message.to_string(), default));
        let answer = self.answers.lock().unwrap().pop_front().flatten();
        Ok(answer.unwrap_or(default))
    }
}

/// Records command lines instead of running them
#[derive(Clone)]
pub struct RecordingRunner {
    commands: Arc<Mutex<Vec<String>>>,
    exit_code: i32,
}

impl RecordingRunner {
    pub fn new(exit_code: i32) -> Self {
        Self {
            commands: Arc::default(),
            exit_code,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command_line: &str) -> AuditDogResult<i32> {
        self.commands.lock().unwrap().push(command_line.to_string());
        Ok(self.exit_code)
    }
}
