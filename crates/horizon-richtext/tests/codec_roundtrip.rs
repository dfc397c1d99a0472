//! Export and import through the context's format registry.

use horizon_richtext::format::LineEnding;
use horizon_richtext::model::{Color, TextAlignment};
use horizon_richtext::{
    DataFormat, DataFormatRegistry, EditorConfig, EditorContext, RichTextArea, RichTextError, StyleAttributeMap,
    StyledTextModel, TextPos,
};

fn area_with(config: EditorConfig, text: &str) -> RichTextArea {
    let context = EditorContext::new(config).unwrap();
    RichTextArea::with_model(context, StyledTextModel::with_text(text))
}

fn styled_area() -> RichTextArea {
    let mut area = area_with(EditorConfig::default(), "Title\nsome bold and red text\n");
    area.set_paragraph_attributes(
        TextPos::ZERO,
        TextPos::ZERO,
        &StyleAttributeMap::new().with_alignment(TextAlignment::Center),
    )
    .unwrap();
    area.apply_style(
        TextPos::leading(1, 5),
        TextPos::leading(1, 9),
        &StyleAttributeMap::new().with_bold(true),
    )
    .unwrap();
    area.apply_style(
        TextPos::leading(1, 14),
        TextPos::leading(1, 17),
        &StyleAttributeMap::new().with_text_color(Color::RED).with_italic(true),
    )
    .unwrap();
    area
}

#[test]
fn test_plain_export_uses_configured_line_ending() {
    let config = EditorConfig {
        line_ending: LineEnding::CrLf,
        ..Default::default()
    };
    let area = area_with(config, "a\nb\n");
    assert_eq!(area.export(DataFormat::PlainText).unwrap(), "a\r\nb\r\n");
}

#[test]
fn test_plain_import_accepts_mixed_line_endings() {
    let mut area = area_with(EditorConfig::default(), "");
    area.import(DataFormat::PlainText, "one\rtwo\r\nthree\nfour").unwrap();
    assert_eq!(area.paragraph_count(), 4);
    assert_eq!(area.plain_text(2), "three");
    assert_eq!(area.text(), "one\ntwo\nthree\nfour");
}

#[test]
fn test_rich_text_survives_export_and_import() {
    let source = styled_area();
    let encoded = source.export(DataFormat::RichText).unwrap();

    let mut target = area_with(EditorConfig::default(), "to be replaced");
    target.import(DataFormat::RichText, &encoded).unwrap();

    let (src, dst) = (source.model().unwrap(), target.model().unwrap());
    assert_eq!(dst.paragraph_count(), src.paragraph_count());
    for ix in 0..src.paragraph_count() {
        assert_eq!(dst.plain_text(ix), src.plain_text(ix));
        for off in 0..src.paragraph_length(ix) {
            let pos = TextPos::leading(ix, off);
            assert_eq!(dst.attributes_at(pos), src.attributes_at(pos), "at ({ix}, {off})");
        }
    }
    assert_eq!(
        dst.paragraph(0).unwrap().attributes().alignment(),
        Some(TextAlignment::Center)
    );
    assert!(dst.attributes_at(TextPos::leading(1, 6)).is_bold());
    assert_eq!(dst.attributes_at(TextPos::leading(1, 15)).text_color(), Some(Color::RED));
}

#[test]
fn test_rich_copy_between_areas_keeps_styles() {
    let mut source = styled_area();
    source.select(TextPos::leading(1, 5), TextPos::leading(1, 17));
    let clip = source.copy(DataFormat::RichText).unwrap().unwrap();

    let mut target = area_with(EditorConfig::default(), "[]");
    target.select_caret(TextPos::leading(0, 1));
    target.paste(DataFormat::RichText, &clip).unwrap();

    assert_eq!(target.text(), "[bold and red]");
    let model = target.model().unwrap();
    assert!(model.attributes_at(TextPos::leading(0, 1)).is_bold());
    assert!(!model.attributes_at(TextPos::leading(0, 6)).is_bold());
    assert!(model.attributes_at(TextPos::leading(0, 10)).is_italic());
    assert!(!model.attributes_at(TextPos::leading(0, 13)).is_italic());
    assert_eq!(target.caret_position(), Some(TextPos::leading(0, 13)));

    // a paste is one undoable edit
    target.undo().unwrap();
    assert_eq!(target.text(), "[]");
}

#[test]
fn test_malformed_paste_changes_nothing() {
    let mut area = area_with(EditorConfig::default(), "keep me");
    area.select(TextPos::ZERO, TextPos::leading(0, 4));
    let err = area.paste(DataFormat::RichText, "ok\n`B``bad%zz").unwrap_err();
    assert!(matches!(err, RichTextError::Decode { .. }));
    assert_eq!(area.text(), "keep me");
    assert!(!area.is_undoable());
}

#[test]
fn test_unregistered_formats() {
    let registry = DataFormatRegistry::standard(LineEnding::Lf);
    assert!(registry.is_supported(DataFormat::PlainText));
    assert!(registry.is_supported(DataFormat::RichText));
    assert!(!registry.is_supported(DataFormat::Rtf));

    let area = area_with(EditorConfig::default(), "x");
    match area.export(DataFormat::Rtf) {
        Err(RichTextError::NotSupported(mime)) => assert_eq!(mime, DataFormat::Rtf.mime_type()),
        other => panic!("unexpected {other:?}"),
    }
    let empty = DataFormatRegistry::new();
    assert!(empty.supported_formats().is_empty());
    assert!(empty.import(DataFormat::PlainText, "x").is_err());
}
