//! Runs a list of prompts against one client with bounded concurrency.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use crate::{
    commands::options::CallOptions, response::ClaudeResponse, ClaudeCode, ClaudeCodeError,
};

/// One queued prompt.
#[derive(Clone, Debug)]
pub struct BatchOperation {
    pub prompt: String,
    pub options: CallOptions,
}

pub type BatchResult = Result<ClaudeResponse, ClaudeCodeError>;

/// Queue of prompts executed with at most `max_parallel` calls in flight.
///
/// Results keep operation order. With `fail_fast`, the first error stops
/// scheduling: operations not yet started never run, calls already running
/// finish and keep their place next to the error.
#[derive(Debug)]
pub struct ClaudeCodeBatch<'a> {
    client: &'a ClaudeCode,
    operations: Vec<BatchOperation>,
    results: Vec<BatchResult>,
    max_parallel: usize,
}

impl<'a> ClaudeCodeBatch<'a> {
    /// Sequential batch.
    pub fn new(client: &'a ClaudeCode) -> Self {
        Self {
            client,
            operations: Vec::new(),
            results: Vec::new(),
            max_parallel: 1,
        }
    }

    /// Values below one are treated as one.
    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn add_operation(&mut self, prompt: impl Into<String>, options: CallOptions) -> &mut Self {
        self.operations.push(BatchOperation {
            prompt: prompt.into(),
            options,
        });
        self
    }

    pub fn operations(&self) -> &[BatchOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Runs every queued operation and replaces the previous results.
    pub async fn execute(&mut self, fail_fast: bool) -> &[BatchResult] {
        let client = self.client;
        let mut queue = self.operations.iter().cloned().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut finished: Vec<(usize, BatchResult)> = Vec::with_capacity(self.operations.len());
        let mut stopped = false;

        loop {
            while !stopped && in_flight.len() < self.max_parallel {
                let Some((index, op)) = queue.next() else {
                    break;
                };
                in_flight.push(async move {
                    let result = client.call_with(&op.prompt, op.options).await;
                    (index, result)
                });
            }

            let Some((index, result)) = in_flight.next().await else {
                break;
            };
            if let Err(err) = &result {
                warn!(index, error = %err, "batch operation failed");
                if fail_fast && !stopped {
                    stopped = true;
                    debug!(
                        running = in_flight.len(),
                        total = self.operations.len(),
                        "batch stops scheduling after first failure"
                    );
                }
            }
            finished.push((index, result));
        }

        finished.sort_by_key(|(index, _)| *index);
        self.results = finished.into_iter().map(|(_, result)| result).collect();
        &self.results
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn successful_results(&self) -> Vec<&ClaudeResponse> {
        self.results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }

    pub fn failed_results(&self) -> Vec<&ClaudeCodeError> {
        self.results.iter().filter_map(|r| r.as_ref().err()).collect()
    }

    /// Drops queued operations and stored results.
    pub fn clear(&mut self) {
        self.operations.clear();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_prompts_fail_fast_in_order() {
        let client = ClaudeCode::builder()
            .binary("/nonexistent/claude")
            .build()
            .unwrap();
        let mut batch = ClaudeCodeBatch::new(&client);
        batch
            .add_operation("", CallOptions::new())
            .add_operation("second", CallOptions::new());
        assert_eq!(batch.len(), 2);

        let results = batch.execute(true).await;
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ClaudeCodeError::InvalidRequest(_))));
        assert_eq!(batch.failed_results().len(), 1);
        assert!(batch.successful_results().is_empty());

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.results().is_empty());
    }

    #[tokio::test]
    async fn without_fail_fast_every_operation_reports() {
        let client = ClaudeCode::builder()
            .binary("/nonexistent/claude")
            .build()
            .unwrap();
        let mut batch = ClaudeCodeBatch::new(&client).max_parallel(4);
        batch
            .add_operation("", CallOptions::new())
            .add_operation("  ", CallOptions::new())
            .add_operation("", CallOptions::new());

        let results = batch.execute(false).await;
        assert_eq!(results.len(), 3);
        assert_eq!(batch.failed_results().len(), 3);
    }
}
