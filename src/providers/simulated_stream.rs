//! Replays one materialized completion as a sequence of streaming chunks.
//!
//! Order is fixed: one chunk per tool call, then the content cut into
//! [`CHUNK_SIZE`]-character segments, then a bare terminal chunk when the
//! reply carried tool calls but no text. Only the last chunk emitted carries
//! the finish reason and real usage.

use std::iter::FusedIterator;

use super::types::{FinishReason, StreamingChunk, Usage};
use super::Completion;
use crate::tools::ToolCall;

/// Characters per text segment
pub const CHUNK_SIZE: usize = 10;

/// Lazy, finite, non-restartable chunk sequence over one completion.
///
/// A completion with neither content nor tool calls yields nothing at all,
/// not even a terminal chunk.
#[derive(Debug)]
pub struct SimulatedStream {
    tool_calls: std::vec::IntoIter<ToolCall>,
    had_tool_calls: bool,
    content: String,
    /// Byte offset of the next unsent segment
    offset: usize,
    trailer_pending: bool,
    finish_reason: Option<FinishReason>,
    usage: Usage,
}

impl SimulatedStream {
    pub fn new(completion: Completion) -> Self {
        let Completion {
            message,
            finish_reason,
            usage,
            ..
        } = completion;
        let had_tool_calls = !message.tool_calls.is_empty();

        Self {
            trailer_pending: had_tool_calls && message.content.is_empty(),
            tool_calls: message.tool_calls.into_iter(),
            had_tool_calls,
            content: message.content,
            offset: 0,
            finish_reason,
            usage,
        }
    }

    fn next_segment(&mut self) -> Option<StreamingChunk> {
        let rest = self.content.get(self.offset..).filter(|rest| !rest.is_empty())?;
        let len = rest
            .char_indices()
            .nth(CHUNK_SIZE)
            .map_or(rest.len(), |(idx, _)| idx);
        let segment = rest[..len].to_string();
        self.offset += len;

        if self.offset < self.content.len() {
            return Some(StreamingChunk::text(segment));
        }

        Some(StreamingChunk::last(
            segment,
            !self.had_tool_calls,
            self.finish_reason.take(),
            std::mem::take(&mut self.usage),
        ))
    }
}

impl Iterator for SimulatedStream {
    type Item = StreamingChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(call) = self.tool_calls.next() {
            return Some(StreamingChunk::tool_use(call));
        }

        if let Some(chunk) = self.next_segment() {
            return Some(chunk);
        }

        if std::mem::take(&mut self.trailer_pending) {
            return Some(StreamingChunk::last(
                String::new(),
                true,
                self.finish_reason.take(),
                std::mem::take(&mut self.usage),
            ));
        }

        None
    }
}

impl FusedIterator for SimulatedStream {}

impl From<Completion> for SimulatedStream {
    fn from(completion: Completion) -> Self {
        Self::new(completion)
    }
}
