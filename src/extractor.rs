use async_trait::async_trait;

use crate::{FeedError, Token, TokenSource};

/// Schema-specific field capture driven by [`crate::FeedParser`].
///
/// An extractor owns one working record and its open-context flags. It is
/// not reentrant: a single instance must serve one run at a time.
#[async_trait]
pub trait Extractor: Send {
    type Record: Send;

    /// Called for every named object start. Returns true when `name` is a
    /// tracked context, which is then marked open.
    fn on_object_start(&mut self, name: &str) -> bool;

    /// Called for every named object end. Returns true only when this closes
    /// a record boundary that was previously opened.
    fn on_object_end(&mut self, name: &str) -> bool;

    /// Inspects a field name or scalar. When the open contexts and the field
    /// name select a capture, the value is pulled from `tokens`.
    /// Unrecognised tokens are ignored.
    async fn on_token(
        &mut self,
        token: &Token,
        tokens: &mut dyn TokenSource,
    ) -> Result<(), FeedError>;

    /// Moves the captured fields into `record` and resets for the next one.
    fn populate(&mut self, record: &mut Self::Record);

    /// Restores the working record and context flags to their defaults.
    fn reset(&mut self);

    fn is_inside_any_tracked_context(&self) -> bool;
}

/// Produces empty output records for the driving loop.
pub trait RecordFactory<T> {
    fn create_record(&self) -> T;
}

impl<T, F: Fn() -> T> RecordFactory<T> for F {
    fn create_record(&self) -> T {
        self()
    }
}
