//! Document, marker and selection behavior through the public API.

use std::sync::Arc;

use parking_lot::Mutex;

use horizon_richtext::model::{ChangeKind, Color, StyledSegment, UndoState};
use horizon_richtext::{
    ContentChange, EditorConfig, EditorContext, RichTextArea, SelectionSegment, StyleAttributeMap, StyledTextModel,
    TextPos,
};

fn p(index: usize, offset: usize) -> TextPos {
    TextPos::leading(index, offset)
}

#[test]
fn test_text_pos_equality_is_index_offset_and_edge() {
    assert_eq!(TextPos::new(1, 4, 4, true), TextPos::new(1, 4, 0, true));
    assert_ne!(TextPos::leading(1, 4), TextPos::trailing(1, 4));
    assert_ne!(p(1, 4), p(1, 5));
    assert_ne!(p(1, 4), p(2, 4));
    assert!(TextPos::trailing(1, 4) < TextPos::leading(1, 4));
    assert!(p(0, 99) < p(1, 0));
}

#[test]
fn test_negative_components_rejected() {
    assert!(TextPos::try_new(-1, 0, 0, true).is_err());
    assert!(TextPos::try_new(0, -3, 0, true).is_err());
    assert_eq!(TextPos::try_new(2, 3, 3, true).unwrap(), p(2, 3));
}

#[test]
fn test_marker_after_same_paragraph_edit_shifts_by_net_length() {
    let mut model = StyledTextModel::with_text("hello wonderful world");
    let marker = model.get_marker(p(0, 16));

    // replace "wonderful" (9 chars) with "big" (3 chars)
    model.replace(p(0, 6), p(0, 15), "big", true).unwrap();
    assert_eq!(model.plain_text(0), "hello big world");
    assert_eq!(model.marker_position(marker), Some(p(0, 10)));

    // an edit ending exactly at the marker still moves it
    model.replace(p(0, 6), p(0, 10), "", true).unwrap();
    assert_eq!(model.marker_position(marker), Some(p(0, 6)));
}

#[test]
fn test_undo_of_redo_restores_document() {
    let mut model = StyledTextModel::with_text("one\ntwo");
    model.replace(p(0, 1), p(1, 1), "X\nY", true).unwrap();
    let edited = model.text_range(TextPos::ZERO, model.document_end());

    model.undo().unwrap();
    let original = model.text_range(TextPos::ZERO, model.document_end());
    assert_eq!(original, "one\ntwo");

    model.redo().unwrap();
    assert_eq!(model.text_range(TextPos::ZERO, model.document_end()), edited);
    model.undo().unwrap();
    assert_eq!(model.text_range(TextPos::ZERO, model.document_end()), original);
}

#[test]
fn test_selection_segment_recovers_endpoints() {
    let pairs = [
        (p(0, 0), p(0, 0)),
        (p(0, 5), p(0, 2)),
        (p(3, 1), p(1, 7)),
        (TextPos::trailing(2, 4), TextPos::leading(2, 4)),
    ];
    for (anchor, caret) in pairs {
        let segment = SelectionSegment::new(anchor, caret);
        assert!(segment.min() <= segment.max());
        assert_eq!(segment.anchor(), anchor);
        assert_eq!(segment.caret(), caret);
    }
}

#[test]
fn test_rich_text_round_trip_keeps_styles() {
    let bold = StyleAttributeMap::new().with_bold(true);
    let italic_red = StyleAttributeMap::new()
        .with_italic(true)
        .with_text_color(Color::rgb(200, 0, 0));
    let centered = StyleAttributeMap::new().with_alignment(horizon_richtext::model::TextAlignment::Center);
    let source = StyledTextModel::from_input(vec![
        StyledSegment::ParagraphAttributes(centered),
        StyledSegment::text("plain "),
        StyledSegment::styled("bold", bold.clone()),
        StyledSegment::LineBreak,
        StyledSegment::styled("red `100%`", italic_red.clone()),
        StyledSegment::styled(" bold again", bold),
    ]);

    let encoded = horizon_richtext::format::encode(&source.styled_range(TextPos::ZERO, source.document_end()));
    let decoded = horizon_richtext::format::decode(&encoded).unwrap();
    let copy = StyledTextModel::from_input(decoded);

    assert_eq!(copy.paragraph_count(), source.paragraph_count());
    for ix in 0..source.paragraph_count() {
        assert_eq!(copy.plain_text(ix), source.plain_text(ix));
        assert_eq!(
            copy.paragraph(ix).unwrap().attributes(),
            source.paragraph(ix).unwrap().attributes()
        );
        for off in 0..source.paragraph_length(ix) {
            assert_eq!(copy.attributes_at(p(ix, off)), source.attributes_at(p(ix, off)), "at ({ix}, {off})");
        }
    }
}

#[test]
fn test_insert_into_empty_paragraph_leaves_later_markers() {
    let mut model = StyledTextModel::with_text("abcde\n\n0123456789");
    assert_eq!(model.paragraph_length(0), 5);
    assert_eq!(model.paragraph_length(1), 0);
    assert_eq!(model.paragraph_length(2), 10);
    let marker = model.get_marker(p(2, 3));

    model.replace(p(1, 0), p(1, 0), "XY", true).unwrap();

    assert_eq!(model.plain_text(1), "XY");
    assert_eq!(model.paragraph_length(1), 2);
    assert_eq!(model.paragraph_count(), 3);
    assert_eq!(model.marker_position(marker), Some(p(2, 3)));
}

#[test]
fn test_extend_selection_from_caret() {
    let context = EditorContext::new(EditorConfig::default()).unwrap();
    let mut area = RichTextArea::with_model(context, StyledTextModel::with_text("abc\ndef"));
    area.select(p(0, 2), p(0, 2));
    area.extend_selection(p(1, 0));

    assert_eq!(area.anchor_position(), Some(p(0, 2)));
    assert_eq!(area.caret_position(), Some(p(1, 0)));
    let segment = area.selection().unwrap();
    assert_eq!(segment.min(), p(0, 2));
    assert_eq!(segment.max(), p(1, 0));
}

#[test]
fn test_extend_selection_onto_anchor_keeps_anchor() {
    let context = EditorContext::new(EditorConfig::default()).unwrap();
    let mut area = RichTextArea::with_model(context, StyledTextModel::with_text("abcdef"));
    area.select(p(0, 2), p(0, 5));
    area.extend_selection(p(0, 2));

    assert_eq!(area.anchor_position(), Some(p(0, 2)));
    assert_eq!(area.caret_position(), Some(p(0, 2)));
    assert!(!area.has_non_empty_selection());
}

#[test]
fn test_no_document_scroll_bar() {
    let context = EditorContext::new(EditorConfig::default()).unwrap();
    let mut area = RichTextArea::new(context);
    area.set_size(300.0, 200.0);
    area.reconcile();

    let vsb = area.flow().vertical_scroll_bar();
    assert_eq!(vsb.visible_amount, 1.0);
    assert_eq!(vsb.value, 0.0);
}

#[test]
fn test_redo_before_undo_is_noop() {
    let mut model = StyledTextModel::with_text("abc");
    model.replace(p(0, 3), p(0, 3), "d", true).unwrap();
    assert_eq!(model.undo_state(), UndoState::UndoAvailable);

    assert_eq!(model.redo().unwrap(), None);
    assert_eq!(model.plain_text(0), "abcd");
    assert_eq!(model.undo_state(), UndoState::UndoAvailable);
}

#[test]
fn test_empty_replace_is_complete_noop() {
    let mut model = StyledTextModel::with_text("abc");
    let marker = model.get_marker(p(0, 1));
    let seen = Arc::new(Mutex::new(Vec::<ChangeKind>::new()));
    let sink = Arc::clone(&seen);
    model
        .content_changed()
        .connect(move |change: &ContentChange| sink.lock().push(change.kind));

    let pos = model.replace(TextPos::ZERO, TextPos::ZERO, "", true).unwrap();

    assert_eq!(pos, TextPos::ZERO);
    assert_eq!(model.undo_state(), UndoState::Clean);
    assert!(seen.lock().is_empty());
    assert_eq!(model.marker_position(marker), Some(p(0, 1)));
    assert_eq!(model.plain_text(0), "abc");
}
