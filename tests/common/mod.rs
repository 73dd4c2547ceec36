//! Shared test helpers

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use commitsmith::ai::{ModelClient, ModelFailure, ModelParams, Prompt};

/// Model client answering from a script and recording every prompt.
///
/// The last scripted answer repeats once the script runs out.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, ModelFailure>>>,
    last: Mutex<Option<Result<String, ModelFailure>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl ScriptedClient {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ModelFailure>>,
    {
        Self {
            script: Mutex::new(answers.into_iter().collect()),
            last: Mutex::new(None),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always return the same answer
    pub fn always(answer: Result<String, ModelFailure>) -> Self {
        Self::new([answer])
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<Prompt>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, prompt: &Prompt, _params: &ModelParams) -> Result<String, ModelFailure> {
        self.prompts.lock().unwrap().push(prompt.clone());

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(answer) = next {
            *last = Some(answer);
        }
        last.clone().unwrap_or(Err(ModelFailure::EmptyResponse))
    }
}
