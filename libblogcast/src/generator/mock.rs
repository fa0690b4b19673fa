//! Scripted generator for tests and offline runs
//!
//! Responses are consumed in order; once the script runs out the fallback
//! text is returned on every call.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{GenerationError, Result};
use crate::generator::ContentGenerator;

#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    script: Arc<Mutex<VecDeque<std::result::Result<String, GenerationError>>>>,
    fallback: Option<String>,
    /// Every prompt received, in call order
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    /// Always answer with `text`
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Default::default()
        }
    }

    /// Answer with each scripted result once, then fail with `EmptyResponse`
    pub fn scripted<I>(results: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<String, GenerationError>>,
    {
        Self {
            script: Arc::new(Mutex::new(results.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Fail `failures` times with a transient network error, then answer with `text`
    pub fn failing_then(failures: usize, text: impl Into<String>) -> Self {
        let script = (0..failures)
            .map(|i| Err(GenerationError::Network(format!("simulated failure {}", i + 1))));
        Self {
            fallback: Some(text.into()),
            ..Self::scripted(script)
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(result) => Ok(result?),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| GenerationError::EmptyResponse.into()),
        }
    }
}
