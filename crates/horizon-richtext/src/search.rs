//! Find text in a background worker.
//!
//! A search runs over a snapshot of the paragraph texts, so the document can
//! keep changing while it runs. Results come back to the owning thread
//! through [`Worker::process_callbacks`]; a search that was superseded or
//! cancelled never delivers anything, not even partial matches.

use std::sync::Arc;

use horizon_richtext_core::logging::{span_names, targets};
use horizon_richtext_core::{CancellationToken, Worker};
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};

use crate::error::{Result, RichTextError};
use crate::model::{StyledTextModel, TextPos};

/// How a query is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// Treat the query as a regular expression instead of literal text.
    pub use_regex: bool,
}

/// A match, from its first char to just past its last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchMatch {
    pub start: TextPos,
    pub end: TextPos,
}

/// A compiled query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    regex: Regex,
}

impl SearchQuery {
    /// Compile `text` according to `options`. An invalid pattern is an
    /// [`RichTextError::InvalidArgument`].
    pub fn new(text: &str, options: &FindOptions) -> Result<Self> {
        if text.is_empty() {
            return Err(RichTextError::invalid_argument("empty search query"));
        }
        let pattern = if options.use_regex {
            text.to_string()
        } else {
            regex::escape(text)
        };
        let pattern = if options.whole_word {
            format!(r"\b(?:{pattern})\b")
        } else {
            pattern
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|e| RichTextError::invalid_argument(format!("invalid search pattern: {e}")))?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Non-empty matches in one paragraph as char ranges.
    fn find_in(&self, text: &str) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut chars = 0;
        let mut byte = 0;
        for m in self.regex.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            chars += text[byte..m.start()].chars().count();
            let len = m.as_str().chars().count();
            out.push((chars, chars + len));
            chars += len;
            byte = m.end();
        }
        out
    }
}

/// The texts of every paragraph, for searching off the owning thread.
pub fn snapshot(model: &StyledTextModel) -> Vec<String> {
    model.paragraphs().iter().map(|p| p.text().to_string()).collect()
}

/// Scan `paragraphs` for `query`.
///
/// The token is checked before each paragraph. Returns `None` when the
/// search was cancelled.
pub fn find_in_paragraphs(
    paragraphs: &[String],
    query: &SearchQuery,
    token: &CancellationToken,
) -> Option<Vec<SearchMatch>> {
    let _span = tracing::debug_span!(target: targets::SEARCH, span_names::SEARCH, rows = paragraphs.len()).entered();
    let mut matches = Vec::new();
    for (index, text) in paragraphs.iter().enumerate() {
        if token.is_cancelled() {
            tracing::debug!(target: targets::SEARCH, index, "search cancelled");
            return None;
        }
        matches.extend(query.find_in(text).into_iter().map(|(start, end)| SearchMatch {
            start: TextPos::leading(index, start),
            end: TextPos::leading(index, end),
        }));
    }
    Some(matches)
}

/// What a finished search task hands back.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub generation: u64,
    /// `None` when the task saw its cancellation.
    pub matches: Option<Vec<SearchMatch>>,
}

/// Runs one search at a time on a worker; starting a new search cancels
/// the previous one.
#[derive(Debug, Default)]
pub struct BackgroundSearch {
    generation: u64,
    token: Option<CancellationToken>,
    inbox: Arc<Mutex<Vec<SearchOutcome>>>,
}

impl BackgroundSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent search.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a search is running or its result has not been polled.
    pub fn is_pending(&self) -> bool {
        self.token.is_some()
    }

    /// Submit a search over `paragraphs`. Returns its generation.
    pub fn start(
        &mut self,
        worker: &Worker<SearchOutcome>,
        paragraphs: Vec<String>,
        query: SearchQuery,
    ) -> Result<u64> {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        self.token = Some(token.clone());

        tracing::debug!(
            target: targets::SEARCH,
            generation,
            pattern = query.as_str(),
            paragraphs = paragraphs.len(),
            "search started"
        );
        let inbox = Arc::clone(&self.inbox);
        worker.send_with_callback(
            move || SearchOutcome {
                generation,
                matches: find_in_paragraphs(&paragraphs, &query, &token),
            },
            move |outcome| inbox.lock().push(outcome),
        )?;
        Ok(generation)
    }

    /// Cancel the running search, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Collect finished searches. Returns the matches of the current
    /// generation once it has completed; stale and cancelled outcomes are
    /// dropped.
    pub fn poll(&mut self, worker: &Worker<SearchOutcome>) -> Option<Vec<SearchMatch>> {
        worker.process_callbacks();
        let outcomes = std::mem::take(&mut *self.inbox.lock());
        let mut result = None;
        for outcome in outcomes {
            if outcome.generation != self.generation {
                continue;
            }
            if let Some(matches) = outcome.matches {
                self.token = None;
                result = Some(matches);
            }
        }
        result
    }
}
