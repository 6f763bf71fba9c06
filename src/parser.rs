use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, instrument, trace, warn};

use crate::{
    metrics, Extractor, FeedError, JsonTokenizer, ParserConfig, RecordFactory, Token, TokenSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Running,
    Cancelled,
    Error,
    Done,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Cancelled | RunState::Error | RunState::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Cancelled => "cancelled",
            RunState::Error => "error",
            RunState::Done => "done",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requests cancellation of a run from another task or thread.
///
/// The request is observed between token reads, so a capture that is
/// already consuming a nested array finishes first.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    requested: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

/// Drives a token stream through an [`Extractor`], collecting one record per
/// completed record boundary.
pub struct FeedParser {
    config: ParserConfig,
    state: RunState,
    cancel: CancelHandle,
    last_error: Option<FeedError>,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
            cancel: CancelHandle::default(),
            last_error: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The failure that ended the last run in `RunState::Error`.
    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns to `Idle` and drops any pending cancel request.
    pub fn reset(&mut self) -> Result<(), FeedError> {
        if self.state == RunState::Running {
            return Err(FeedError::Busy);
        }
        self.state = RunState::Idle;
        self.last_error = None;
        self.cancel.clear();
        Ok(())
    }

    /// Parses the JSON document read from `reader`, appending a record to
    /// `records` for every record boundary the extractor reports closed.
    ///
    /// Records appended before a failure or cancellation are kept.
    pub async fn run<R, E, F>(
        &mut self,
        reader: R,
        records: &mut Vec<E::Record>,
        factory: &F,
        extractor: &mut E,
    ) -> RunState
    where
        R: AsyncRead + Unpin + Send,
        E: Extractor,
        F: RecordFactory<E::Record>,
    {
        let mut tokens = JsonTokenizer::with_config(reader, self.config.clone());
        self.run_tokens(&mut tokens, records, factory, extractor).await
    }

    #[instrument(skip_all, fields(records_before = records.len()))]
    pub async fn run_tokens<S, E, F>(
        &mut self,
        tokens: &mut S,
        records: &mut Vec<E::Record>,
        factory: &F,
        extractor: &mut E,
    ) -> RunState
    where
        S: TokenSource,
        E: Extractor,
        F: RecordFactory<E::Record>,
    {
        self.state = RunState::Running;
        self.last_error = None;
        extractor.reset();

        let emitted_before = records.len();
        let outcome = self.drive(tokens, records, factory, extractor).await;
        self.state = match outcome {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "feed parse failed");
                self.last_error = Some(e);
                RunState::Error
            }
        };
        self.cancel.clear();

        debug!(
            state = %self.state,
            records = records.len() - emitted_before,
            "feed run finished"
        );
        metrics::inc_runs(self.state);
        self.state
    }

    async fn drive<S, E, F>(
        &mut self,
        tokens: &mut S,
        records: &mut Vec<E::Record>,
        factory: &F,
        extractor: &mut E,
    ) -> Result<RunState, FeedError>
    where
        S: TokenSource,
        E: Extractor,
        F: RecordFactory<E::Record>,
    {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(RunState::Cancelled);
            }

            match tokens.next_token().await? {
                Token::EndOfStream => return Ok(RunState::Done),
                Token::ObjectStart(Some(name)) => {
                    if extractor.on_object_start(&name) {
                        trace!(context = %name, "context opened");
                    }
                }
                Token::ObjectEnd(Some(name)) => {
                    if extractor.on_object_end(&name) {
                        let mut record = factory.create_record();
                        extractor.populate(&mut record);
                        records.push(record);
                        metrics::inc_records();
                        debug!(index = records.len() - 1, "record emitted");
                    }
                }
                Token::ObjectStart(None) | Token::ObjectEnd(None) => {}
                token => {
                    trace!(
                        tracked = extractor.is_inside_any_tracked_context(),
                        %token,
                        "dispatch"
                    );
                    extractor.on_token(&token, tokens).await?;
                }
            }
        }
    }
}
