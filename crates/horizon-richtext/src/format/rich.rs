//! Backtick-delimited rich text codec.
//!
//! One line per paragraph. A paragraph may open with a paragraph attribute
//! block `` `^`AC`` ``; after that, text runs follow, each optionally preceded
//! by a style header. A header is either `` `` `` (back to the default
//! style) or one or more `` `<letter><payload> `` tokens closed by
//! `` `` ``. A style stays in effect until the next header or the end of the
//! paragraph.
//!
//! Every explicit non-empty attribute set is appended to a table as it is
//! written; a later identical set is written as a back-reference `` `$n`` ``.
//! Backtick, percent, CR and LF are escaped as `%XX` in text and payloads.
//! Embedded regions cannot be represented and are written as empty
//! paragraphs.

use std::fmt::Write as _;

use horizon_richtext_core::logging::targets;

use super::{DataFormat, DataFormatHandler};
use crate::error::{Result, RichTextError};
use crate::model::{
    AttrValue, Color, ParagraphDirection, StyleAttribute, StyleAttributeMap, StyledInput, StyledSegment,
    StyledTextModel, TextAlignment, TextPos,
};

const TICK: char = '`';
const ESCAPE: char = '%';
const PARAGRAPH_BLOCK: char = '^';
const BACK_REFERENCE: char = '$';

/// The rich text codec as a [`DataFormatHandler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RichTextHandler;

impl DataFormatHandler for RichTextHandler {
    fn format(&self) -> DataFormat {
        DataFormat::RichText
    }

    fn export(&self, model: &StyledTextModel, start: TextPos, end: TextPos) -> Result<String> {
        Ok(encode(&model.styled_range(start, end)))
    }

    fn import(&self, text: &str) -> Result<StyledInput> {
        Ok(StyledInput::from_segments(decode(text)?))
    }
}

fn letter(attr: StyleAttribute) -> char {
    match attr {
        StyleAttribute::Bold => 'B',
        StyleAttribute::Italic => 'I',
        StyleAttribute::Underline => 'U',
        StyleAttribute::Strikethrough => 'X',
        StyleAttribute::FontFamily => 'F',
        StyleAttribute::FontSize => 'S',
        StyleAttribute::TextColor => 'C',
        StyleAttribute::Background => 'K',
        StyleAttribute::Alignment => 'A',
        StyleAttribute::Direction => 'D',
        StyleAttribute::ParagraphBackground => 'G',
        StyleAttribute::LineSpacing => 'H',
        StyleAttribute::SpaceAbove => 'T',
        StyleAttribute::SpaceBelow => 'V',
        StyleAttribute::FirstLineIndent => 'N',
    }
}

fn attribute_for(c: char) -> Option<StyleAttribute> {
    StyleAttribute::ALL.into_iter().find(|a| letter(*a) == c)
}

// ---- encoding ----

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            TICK | ESCAPE | '\r' | '\n' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
}

fn payload(value: &AttrValue) -> String {
    match value {
        AttrValue::Bool(_) => String::new(),
        AttrValue::Number(n) => n.to_string(),
        AttrValue::Text(s) => {
            let mut out = String::new();
            escape_into(&mut out, s);
            out
        }
        AttrValue::Color(c) => c.to_hex(),
        AttrValue::Alignment(a) => match a {
            TextAlignment::Left => "L",
            TextAlignment::Center => "C",
            TextAlignment::Right => "R",
            TextAlignment::Justify => "J",
        }
        .to_string(),
        AttrValue::Direction(d) => match d {
            ParagraphDirection::LeftToRight => "L",
            ParagraphDirection::RightToLeft => "R",
        }
        .to_string(),
    }
}

#[derive(Default)]
struct Encoder {
    out: String,
    table: Vec<StyleAttributeMap>,
}

impl Encoder {
    /// Write the tokens of a non-empty set, or a back-reference to an
    /// earlier identical one, followed by the terminator.
    fn write_set(&mut self, attrs: &StyleAttributeMap) {
        if let Some(index) = self.table.iter().position(|t| t == attrs) {
            let _ = write!(self.out, "{TICK}{BACK_REFERENCE}{index}");
        } else {
            for (attr, value) in attrs.iter() {
                self.out.push(TICK);
                self.out.push(letter(attr));
                self.out.push_str(&payload(value));
            }
            self.table.push(attrs.clone());
        }
        self.out.push(TICK);
        self.out.push(TICK);
    }

    fn write_paragraph(&mut self, para: &PendingParagraph) {
        if !para.attrs.is_empty() {
            self.out.push(TICK);
            self.out.push(PARAGRAPH_BLOCK);
            self.write_set(&para.attrs);
        }
        let mut current = StyleAttributeMap::new();
        for (text, attrs) in &para.runs {
            if text.is_empty() {
                continue;
            }
            if *attrs != current {
                if attrs.is_empty() {
                    self.out.push(TICK);
                    self.out.push(TICK);
                } else {
                    self.write_set(attrs);
                }
                current = attrs.clone();
            }
            escape_into(&mut self.out, text);
        }
    }
}

#[derive(Default)]
struct PendingParagraph {
    attrs: StyleAttributeMap,
    runs: Vec<(String, StyleAttributeMap)>,
}

/// Encode styled content.
pub fn encode(segments: &[StyledSegment]) -> String {
    let mut encoder = Encoder::default();
    let mut paragraphs = vec![PendingParagraph::default()];

    for segment in segments {
        match segment {
            StyledSegment::Text { text, attrs } => {
                let attrs = attrs.character_attributes().normalized();
                for (n, line) in text.split('\n').enumerate() {
                    if n > 0 {
                        paragraphs.push(PendingParagraph::default());
                    }
                    let line: String = line.chars().filter(|&c| c != '\r').collect();
                    if let Some(para) = paragraphs.last_mut() {
                        para.runs.push((line, attrs.clone()));
                    }
                }
            }
            StyledSegment::LineBreak => paragraphs.push(PendingParagraph::default()),
            StyledSegment::ParagraphAttributes(attrs) => {
                if let Some(para) = paragraphs.last_mut() {
                    para.attrs = attrs.paragraph_attributes().normalized();
                }
            }
            StyledSegment::Region(_) => {}
        }
    }

    for (n, para) in paragraphs.iter().enumerate() {
        if n > 0 {
            encoder.out.push('\n');
        }
        encoder.write_paragraph(para);
    }
    tracing::trace!(
        target: targets::FORMAT,
        paragraphs = paragraphs.len(),
        styles = encoder.table.len(),
        "encoded rich text"
    );
    encoder.out
}

// ---- decoding ----

struct Decoder<'a> {
    chars: &'a [char],
    pos: usize,
    table: Vec<StyleAttributeMap>,
}

impl Decoder<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n'))
    }

    /// Read a `%XX` escape starting at the current `%`.
    fn unescape(&mut self) -> Result<char> {
        let start = self.pos;
        let hex: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
        if hex.chars().count() != 2 {
            return Err(RichTextError::decode(start, "truncated escape"));
        }
        let code = hex
            .chars()
            .all(|c| c.is_ascii_hexdigit())
            .then(|| u32::from_str_radix(&hex, 16).ok())
            .flatten()
            .ok_or_else(|| RichTextError::decode(start, format!("bad hex escape '%{hex}'")))?;
        let c = char::from_u32(code).ok_or_else(|| RichTextError::decode(start, "escape is not a character"))?;
        self.pos += 3;
        Ok(c)
    }

    /// Read escaped text up to the next backtick or line end. Paragraph text
    /// (`content == true`) cannot carry an escaped line break.
    fn read_text(&mut self, content: bool) -> Result<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            match c {
                TICK | '\n' => break,
                ESCAPE => {
                    let start = self.pos;
                    let c = self.unescape()?;
                    if content && matches!(c, '\r' | '\n') {
                        return Err(RichTextError::decode(start, "escaped line break in paragraph text"));
                    }
                    out.push(c);
                }
                c => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(out)
    }

    /// Read tokens after the opening backtick of a header (or paragraph
    /// block) through the closing double backtick.
    fn read_set(&mut self, header_start: usize) -> Result<StyleAttributeMap> {
        let mut attrs = StyleAttributeMap::new();
        let mut explicit = false;
        // Positioned on the backtick that precedes the first token.
        loop {
            if self.peek() != Some(TICK) {
                return Err(RichTextError::decode(header_start, "missing style terminator"));
            }
            if self.peek_at(1) == Some(TICK) {
                self.pos += 2;
                break;
            }
            let token_start = self.pos;
            self.pos += 1;
            let Some(letter) = self.peek().filter(|c| *c != '\n') else {
                return Err(RichTextError::decode(header_start, "missing style terminator"));
            };
            self.pos += 1;
            let payload = self.read_text(false)?;

            if letter == BACK_REFERENCE {
                let referenced = payload
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.table.get(i))
                    .ok_or_else(|| {
                        RichTextError::decode(token_start, format!("invalid style reference '{payload}'"))
                    })?;
                attrs = attrs.combine(referenced);
                continue;
            }

            let attr = attribute_for(letter)
                .ok_or_else(|| RichTextError::decode(token_start, format!("unknown style token '{letter}'")))?;
            let value = parse_value(attr, &payload).ok_or_else(|| {
                RichTextError::decode(token_start, format!("bad value '{payload}' for {}", attr.name()))
            })?;
            attrs
                .set(attr, value)
                .map_err(|e| RichTextError::decode(token_start, e.to_string()))?;
            explicit = true;
        }
        if explicit && !attrs.is_empty() {
            self.table.push(attrs.clone());
        }
        Ok(attrs)
    }

    fn read_paragraph(&mut self, out: &mut Vec<StyledSegment>) -> Result<()> {
        let mut para_attrs = StyleAttributeMap::new();
        if self.peek() == Some(TICK) && self.peek_at(1) == Some(PARAGRAPH_BLOCK) {
            let start = self.pos;
            self.pos += 2;
            para_attrs = self.read_set(start)?.paragraph_attributes();
        }
        out.push(StyledSegment::ParagraphAttributes(para_attrs));

        let mut current = StyleAttributeMap::new();
        while !self.at_line_end() {
            if self.peek() == Some(TICK) {
                let start = self.pos;
                current = if self.peek_at(1) == Some(TICK) {
                    self.pos += 2;
                    StyleAttributeMap::new()
                } else {
                    self.read_set(start)?.character_attributes()
                };
            }
            let text = self.read_text(true)?;
            if !text.is_empty() {
                out.push(StyledSegment::styled(text, current.clone()));
            }
        }
        Ok(())
    }
}

/// Decode content written by [`encode`].
///
/// The whole input is validated before anything is returned. Errors carry
/// the char offset of the offending token.
pub fn decode(text: &str) -> Result<Vec<StyledSegment>> {
    let chars: Vec<char> = text.chars().collect();
    let mut decoder = Decoder {
        chars: &chars,
        pos: 0,
        table: Vec::new(),
    };
    let mut out = Vec::new();
    loop {
        decoder.read_paragraph(&mut out)?;
        match decoder.peek() {
            Some('\n') => {
                decoder.pos += 1;
                out.push(StyledSegment::LineBreak);
            }
            _ => break,
        }
    }
    tracing::trace!(target: targets::FORMAT, segments = out.len(), "decoded rich text");
    Ok(out)
}

fn parse_value(attr: StyleAttribute, payload: &str) -> Option<AttrValue> {
    let value = match attr {
        StyleAttribute::Bold | StyleAttribute::Italic | StyleAttribute::Underline | StyleAttribute::Strikethrough => {
            if !payload.is_empty() {
                return None;
            }
            AttrValue::Bool(true)
        }
        StyleAttribute::FontFamily => AttrValue::Text(payload.to_string()),
        StyleAttribute::FontSize
        | StyleAttribute::LineSpacing
        | StyleAttribute::SpaceAbove
        | StyleAttribute::SpaceBelow
        | StyleAttribute::FirstLineIndent => AttrValue::Number(payload.parse().ok()?),
        StyleAttribute::TextColor | StyleAttribute::Background | StyleAttribute::ParagraphBackground => {
            AttrValue::Color(Color::from_hex(payload)?)
        }
        StyleAttribute::Alignment => AttrValue::Alignment(match payload {
            "L" => TextAlignment::Left,
            "C" => TextAlignment::Center,
            "R" => TextAlignment::Right,
            "J" => TextAlignment::Justify,
            _ => return None,
        }),
        StyleAttribute::Direction => AttrValue::Direction(match payload {
            "L" => ParagraphDirection::LeftToRight,
            "R" => ParagraphDirection::RightToLeft,
            _ => return None,
        }),
    };
    Some(value)
}
