//! Editor configuration.
//!
//! Every tunable the engine reads lives in [`EditorConfig`], which is plain
//! serde data. It can be loaded from and saved to TOML or JSON:
//!
//! ```ignore
//! let config = EditorConfig::load_toml("editor.toml")?;
//! config.save_json("editor.json")?;
//! ```
//!
//! Missing keys fall back to their defaults, so a config file only needs to
//! name what it changes.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RichTextError};
use crate::format::LineEnding;
use crate::layout::Insets;

/// Tunables for the model, layout engine and controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of the realized margin above and below the viewport, in
    /// viewport heights. Values below 1.0 are raised to 1.0.
    pub sliding_window_extent: f64,
    /// Capacity of the paragraph cell cache and of each side decorator cache.
    pub cell_cache_size: usize,
    /// Extra pixels kept visible to the right of the caret when scrolling
    /// horizontally.
    pub horizontal_guard: f64,
    /// Smallest width the viewport is laid out with.
    pub min_viewport_width: f64,
    /// Smallest wrap width handed to the text layout engine.
    pub layout_min_width: f64,
    /// Scroll bar unit increment, as a fraction of the viewport height.
    pub scroll_bar_unit_increment: f64,
    /// Scroll bar block increment, as a fraction of the viewport height.
    pub scroll_bar_block_increment: f64,
    /// Thickness of the scroll bars.
    pub scroll_bar_size: f64,
    /// Full caret blink period (on plus off) in milliseconds. Zero disables
    /// blinking.
    pub caret_blink_period_ms: u64,
    /// Auto-scroll timer period in milliseconds.
    pub auto_scroll_period_ms: u64,
    /// Auto-scroll step when the pointer is far outside the viewport.
    pub auto_scroll_step_fast: f64,
    /// Auto-scroll step when the pointer is just outside the viewport.
    pub auto_scroll_step_slow: f64,
    /// Distance outside the viewport beyond which the fast step is used.
    pub auto_scroll_fast_threshold: f64,
    /// Padding between the viewport edges and the content.
    pub content_padding: Insets,
    /// Wrap paragraphs to the viewport width.
    pub wrap_text: bool,
    /// Size the control to the full content height instead of scrolling.
    pub use_content_height: bool,
    /// Size the control to the widest paragraph instead of scrolling.
    pub use_content_width: bool,
    /// Paint a highlight behind the caret line.
    pub highlight_current_paragraph: bool,
    /// Show the caret.
    pub display_caret: bool,
    /// Tab stop width in characters.
    pub tab_size: usize,
    /// Maximum number of undo entries kept.
    pub undo_limit: usize,
    /// Merge consecutive single-paragraph typing into one undo entry.
    pub coalesce_typing: bool,
    /// Line separator used by plain-text export.
    pub line_ending: LineEnding,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sliding_window_extent: 2.0,
            cell_cache_size: 512,
            horizontal_guard: 20.0,
            min_viewport_width: 10.0,
            layout_min_width: 10.0,
            scroll_bar_unit_increment: 0.1,
            scroll_bar_block_increment: 0.5,
            scroll_bar_size: 12.0,
            caret_blink_period_ms: 1000,
            auto_scroll_period_ms: 100,
            auto_scroll_step_fast: 200.0,
            auto_scroll_step_slow: 20.0,
            auto_scroll_fast_threshold: 100.0,
            content_padding: Insets::ZERO,
            wrap_text: false,
            use_content_height: false,
            use_content_width: false,
            highlight_current_paragraph: false,
            display_caret: true,
            tab_size: 8,
            undo_limit: 100,
            coalesce_typing: false,
            line_ending: LineEnding::platform(),
        }
    }
}

impl EditorConfig {
    /// The sliding window extent, never below one viewport height.
    pub fn effective_window_extent(&self) -> f64 {
        self.sliding_window_extent.max(1.0)
    }

    /// Caret blink period as a duration.
    pub fn caret_blink_period(&self) -> Duration {
        Duration::from_millis(self.caret_blink_period_ms)
    }

    /// Auto-scroll period as a duration.
    pub fn auto_scroll_period(&self) -> Duration {
        Duration::from_millis(self.auto_scroll_period_ms)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RichTextError::Config(e.to_string()))
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RichTextError::Config(e.to_string()))
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| RichTextError::Config(e.to_string()))
    }

    /// Serialize to pretty-printed JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RichTextError::Config(e.to_string()))
    }

    /// Load a TOML configuration file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RichTextError::io(path, e))?;
        tracing::debug!(target: "horizon_richtext::config", path = %path.display(), "loading TOML config");
        Self::from_toml_str(&text)
    }

    /// Load a JSON configuration file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RichTextError::io(path, e))?;
        tracing::debug!(target: "horizon_richtext::config", path = %path.display(), "loading JSON config");
        Self::from_json_str(&text)
    }

    /// Save as TOML, replacing the target atomically.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomic(path.as_ref(), &self.to_toml_string()?)
    }

    /// Save as JSON, replacing the target atomically.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomic(path.as_ref(), &self.to_json_string()?)
    }
}

/// Write to a temporary file next to `path`, sync it, then rename it over
/// the target. On failure the previous file is left untouched.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| RichTextError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| RichTextError::io(path, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| RichTextError::io(path, e))?;
    file.persist(path)
        .map_err(|e| RichTextError::io(path, e.error))?;

    tracing::debug!(target: "horizon_richtext::config", path = %path.display(), "config saved");
    Ok(())
}
