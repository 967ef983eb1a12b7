//! Common test helpers shared across test modules.
use std::{path::Path, sync::Mutex};

use crate::{
    git::{CommandOutput, CommandRunner},
    result::Result,
};

/// One recorded subprocess invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: String,
    pub envs: Vec<(String, String)>,
}

/// A [`CommandRunner`] that replays scripted output instead of spawning
/// processes. Responses match on a command line prefix; anything without
/// a script succeeds with empty output. Every invocation is recorded.
pub struct ScriptedRunner {
    responses: Vec<(String, CommandOutput)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            responses: vec![],
            calls: Mutex::new(vec![]),
        }
    }

    /// Scripts a successful response for commands starting with `prefix`.
    pub fn ok(mut self, prefix: &str, stdout: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            CommandOutput {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Scripts a failing response for commands starting with `prefix`.
    pub fn fail(mut self, prefix: &str, stderr: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.command.clone())
            .collect()
    }

    /// Every invocation with its environment, in order.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _dir: &Path,
        envs: &[(String, String)],
    ) -> Result<CommandOutput> {
        let command = format!("{} {}", program, args.join(" "));

        self.calls.lock().unwrap().push(RecordedCall {
            command: command.clone(),
            envs: envs.to_vec(),
        });

        for (prefix, response) in &self.responses {
            if command.starts_with(prefix) {
                return Ok(response.clone());
            }
        }

        Ok(CommandOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
