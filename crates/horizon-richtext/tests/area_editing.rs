//! Editing sessions through the controller.

use std::time::{Duration, Instant};

use horizon_richtext::layout::MonospaceLayoutEngine;
use horizon_richtext::{
    EditorConfig, EditorContext, FindOptions, RichTextArea, RichTextError, SearchMatch, StyleAttributeMap,
    StyledTextModel, TextPos,
};

fn p(index: usize, offset: usize) -> TextPos {
    TextPos::leading(index, offset)
}

fn area_with(config: EditorConfig, text: &str) -> RichTextArea {
    let context = EditorContext::builder()
        .config(config)
        .layout_engine(MonospaceLayoutEngine::new(10.0, 20.0))
        .build()
        .unwrap();
    let mut area = RichTextArea::with_model(context, StyledTextModel::with_text(text));
    area.set_size(200.0, 100.0);
    area
}

fn area(text: &str) -> RichTextArea {
    area_with(EditorConfig::default(), text)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_richtext=debug")
        .with_test_writer()
        .try_init();
}

fn wait_for_search(area: &mut RichTextArea) -> Vec<SearchMatch> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        area.tick(Instant::now());
        if let Some(matches) = area.poll_search() {
            return matches;
        }
        assert!(Instant::now() < deadline, "search did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_typing_session_with_undo() {
    let mut area = area("");
    area.select_caret(TextPos::ZERO);
    area.type_text("Hello").unwrap();
    area.insert_line_break().unwrap();
    area.type_text("world").unwrap();
    area.insert_tab().unwrap();
    assert_eq!(area.text(), "Hello\nworld\t");
    assert_eq!(area.caret_position(), Some(p(1, 6)));

    area.move_paragraph_start();
    area.select_paragraph_end();
    area.apply_style(p(1, 0), p(1, 5), &StyleAttributeMap::new().with_bold(true))
        .unwrap();
    assert!(area.active_style_attributes().is_bold());

    area.undo().unwrap();
    assert!(!area.model().unwrap().attributes_at(p(1, 0)).is_bold());
    area.undo().unwrap();
    assert_eq!(area.text(), "Hello\nworld");
    while area.is_undoable() {
        area.undo().unwrap();
    }
    assert_eq!(area.text(), "");
    assert!(area.is_redoable());
}

#[test]
fn test_vertical_moves_keep_column() {
    let mut area = area("abcdef\nxy\nlonger line");
    area.reconcile();
    area.select_caret(p(0, 4));

    area.move_down();
    assert_eq!(area.caret_position().map(|c| (c.index(), c.offset())), Some((1, 2)));
    area.move_down();
    assert_eq!(area.caret_position().map(|c| (c.index(), c.offset())), Some((2, 4)));
    area.move_up();
    area.move_up();
    assert_eq!(area.caret_position().map(|c| (c.index(), c.offset())), Some((0, 4)));

    // a horizontal move resets the remembered column
    area.move_right();
    area.move_down();
    area.move_down();
    assert_eq!(area.caret_position().map(|c| (c.index(), c.offset())), Some((2, 5)));
}

#[test]
fn test_select_down_extends() {
    let mut area = area("abc\ndef\nghi");
    area.reconcile();
    area.select_caret(p(0, 1));
    area.select_down();
    area.select_down();
    assert_eq!(area.anchor_position(), Some(p(0, 1)));
    assert_eq!(area.caret_position().map(|c| c.index()), Some(2));
    assert!(area.has_non_empty_selection());
}

#[test]
fn test_horizontal_moves_collapse_and_cross_paragraphs() {
    let mut area = area("ab\ncd");
    area.select(p(0, 1), p(1, 1));
    area.move_left();
    assert_eq!(area.caret_position(), Some(p(0, 1)));
    assert!(!area.has_non_empty_selection());

    area.move_right();
    area.move_right();
    assert_eq!(area.caret_position(), Some(p(1, 0)));
    area.select_left();
    assert_eq!(area.anchor_position(), Some(p(1, 0)));
    assert_eq!(area.caret_position(), Some(p(0, 2)));
}

#[test]
fn test_word_commands() {
    let mut area = area("alpha beta gamma");
    area.select_caret(TextPos::ZERO);
    area.next_word();
    assert_eq!(area.caret_position(), Some(p(0, 6)));
    area.next_word_end();
    assert_eq!(area.caret_position(), Some(p(0, 10)));
    area.previous_word();
    assert_eq!(area.caret_position(), Some(p(0, 6)));

    area.select_caret(p(0, 13));
    area.select_word();
    let segment = area.selection().unwrap();
    assert_eq!((segment.min(), segment.max()), (p(0, 11), p(0, 16)));

    area.select_caret(p(0, 13));
    area.delete_word_previous().unwrap();
    assert_eq!(area.text(), "alpha beta mma");
}

#[test]
fn test_document_and_paragraph_selection() {
    let mut area = area("one\ntwo\nthree");
    area.select_caret(p(1, 1));
    area.select_paragraph();
    assert_eq!(area.copy(horizon_richtext::DataFormat::PlainText).unwrap().as_deref(), Some("two"));

    area.select_all();
    assert_eq!(area.selection().unwrap().max(), p(2, 5));
    area.delete_selection().unwrap();
    assert_eq!(area.text(), "");
    assert_eq!(area.paragraph_count(), 1);

    area.undo().unwrap();
    area.move_document_end();
    area.select_document_start();
    assert_eq!(area.anchor_position(), Some(p(2, 5)));
    assert_eq!(area.caret_position(), Some(TextPos::ZERO));
}

#[test]
fn test_background_search() {
    init_tracing();
    let mut area = area("one line\ntwo Lines\nnone");
    area.start_search("line", &FindOptions::default()).unwrap();
    let matches = wait_for_search(&mut area);
    let found: Vec<_> = matches
        .iter()
        .map(|m| (m.start.index(), m.start.offset(), m.end.offset()))
        .collect();
    assert_eq!(found, vec![(0, 4, 8), (1, 4, 8)]);
    assert!(!area.is_search_pending());

    let options = FindOptions {
        case_sensitive: true,
        whole_word: true,
        ..Default::default()
    };
    area.start_search("one", &options).unwrap();
    let matches = wait_for_search(&mut area);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].start, p(0, 0));
}

#[test]
fn test_newer_search_supersedes_older() {
    init_tracing();
    let mut area = area("aaa\nbbb");
    let first = area.start_search("a", &FindOptions::default()).unwrap();
    let second = area.start_search("b", &FindOptions::default()).unwrap();
    assert!(second > first);
    let matches = wait_for_search(&mut area);
    assert!(matches.iter().all(|m| m.start.index() == 1));
    assert_eq!(matches.len(), 3);
}

#[test]
fn test_invalid_regex_is_rejected() {
    let mut area = area("text");
    let options = FindOptions {
        use_regex: true,
        ..Default::default()
    };
    assert!(matches!(
        area.start_search("(", &options),
        Err(RichTextError::InvalidArgument(_))
    ));
    assert!(!area.is_search_pending());
}

#[test]
fn test_blink_disabled_by_config() {
    let config = EditorConfig {
        caret_blink_period_ms: 0,
        ..Default::default()
    };
    let mut area = area_with(config, "abc");
    let t0 = Instant::now();
    area.tick(t0);
    area.select_caret(p(0, 1));
    assert!(!area.is_blinking());
    area.tick(t0 + Duration::from_secs(3));
    assert!(area.is_caret_visible());
}

#[test]
fn test_nothing_fires_after_dispose() {
    let mut area = area("abc");
    let t0 = Instant::now();
    area.tick(t0);
    area.select_caret(p(0, 1));
    area.auto_scroll(-10.0);
    area.dispose();

    area.tick(t0 + Duration::from_secs(5));
    assert!(area.is_caret_visible());
    assert_eq!(area.caret_position(), Some(p(0, 1)));
    assert!(area.poll_search().is_none());
}
