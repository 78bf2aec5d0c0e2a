//! In-process capability double for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{Capability, LlmError};

/// Replies with scripted outputs in order; the last one repeats once the
/// script runs out. An `Err` entry is returned as an API error.
pub struct ScriptedCapability {
    replies: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedCapability {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<String, String> {
        let mut queue = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = queue.pop_front() {
            *last = Some(reply.clone());
            reply
        } else {
            last.clone().unwrap_or_else(|| Err("no scripted reply".to_string()))
        }
    }
}

#[async_trait]
impl Capability for ScriptedCapability {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn available(&self) -> bool {
        true
    }

    async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply().map_err(|message| LlmError::Api {
            status: 500,
            message,
        })
    }
}
