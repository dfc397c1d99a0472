//! Plain text export and import.

use serde::{Deserialize, Serialize};

use super::{DataFormat, DataFormatHandler};
use crate::error::Result;
use crate::model::{StyledInput, StyledTextModel, TextPos};

/// Paragraph separator written by plain text export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Cr,
    CrLf,
    Lf,
}

impl LineEnding {
    /// The host platform's convention.
    pub const fn platform() -> Self {
        if cfg!(windows) { Self::CrLf } else { Self::Lf }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::platform()
    }
}

/// Split on CR, CRLF or LF.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(i) => {
                let skip = if current[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[i + skip..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Paragraph texts joined with a configurable line ending.
#[derive(Debug, Clone, Copy)]
pub struct PlainTextHandler {
    line_ending: LineEnding,
}

impl PlainTextHandler {
    pub fn new(line_ending: LineEnding) -> Self {
        Self { line_ending }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

impl Default for PlainTextHandler {
    fn default() -> Self {
        Self::new(LineEnding::platform())
    }
}

impl DataFormatHandler for PlainTextHandler {
    fn format(&self) -> DataFormat {
        DataFormat::PlainText
    }

    fn export(&self, model: &StyledTextModel, start: TextPos, end: TextPos) -> Result<String> {
        let text = model.text_range(start, end);
        Ok(text.split('\n').collect::<Vec<_>>().join(self.line_ending.as_str()))
    }

    fn import(&self, text: &str) -> Result<StyledInput> {
        let normalized: Vec<&str> = split_lines(text).collect();
        Ok(StyledInput::plain(normalized.join("\n")))
    }
}
