mod common;

use common::{opaque_rgb, page_raster, png, sample_pdf, FakeRenderer, INK_COLOR};
use pretty_assertions::assert_eq;
use veil_core::{
    AnnotationStore, CodecDocument, DocumentCodec, FillColor, ImageAnnotation, PageRenderer, Point,
    Rect, RedactionBox, Rgb, Size, TextAnnotation,
};
use veil::{
    verify_flattened, Compositor, ExportMode, ExportOptions, ExportPipeline, FontSet, LopdfCodec,
    VeilError,
};

const SMALL: Size = Size {
    width: 400.0,
    height: 300.0,
};

fn loaded(source: &[u8], renderer: FakeRenderer) -> FakeRenderer {
    let mut renderer = renderer;
    renderer.load(source).unwrap();
    renderer
}

fn export(
    renderer: &FakeRenderer,
    compositor: &Compositor,
    source: &[u8],
    store: &AnnotationStore,
    mode: ExportMode,
) -> veil::Result<veil::ExportArtifact> {
    ExportPipeline::new(renderer, &LopdfCodec, compositor, ExportOptions::default()).run(
        source,
        "contract.pdf",
        store,
        mode,
    )
}

#[test]
fn test_redaction_replaces_page_pixels() {
    let source = sample_pdf(1, SMALL);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::empty());

    let plain = export(&renderer, &compositor, &source, &AnnotationStore::new(), ExportMode::Secure).unwrap();
    let mut store = AnnotationStore::new();
    store.add_redaction(RedactionBox::new(1, Rect::new(100.0, 100.0, 200.0, 50.0), FillColor::Black));
    let redacted = export(&renderer, &compositor, &source, &store, ExportMode::Secure).unwrap();

    let before = page_raster(&plain.bytes, 1);
    let after = page_raster(&redacted.bytes, 1);
    assert_eq!(before.dimensions(), (800, 600));

    // ink bar at (120,120) lies under the redaction
    assert_eq!(before.get_pixel(300, 250).0, [INK_COLOR[0], INK_COLOR[1], INK_COLOR[2]]);
    assert_eq!(after.get_pixel(300, 250).0, [0, 0, 0]);
    assert_eq!(after.get_pixel(210, 210).0, [0, 0, 0]);
    // outside the box nothing changed
    assert_eq!(after.get_pixel(10, 10).0, [255, 255, 255]);
    assert_eq!(after.get_pixel(700, 500).0, before.get_pixel(700, 500).0);
}

#[test]
fn test_export_without_annotations_is_flat() {
    let source = sample_pdf(2, SMALL);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::empty());

    let artifact = export(&renderer, &compositor, &source, &AnnotationStore::new(), ExportMode::Secure).unwrap();

    assert_eq!(artifact.file_name, "contract_edited.pdf");
    assert_eq!(artifact.report.pages_written, 2);
    assert_eq!(artifact.report.verified, Some(true));
    assert_eq!(artifact.report.sha256.len(), 64);

    let output = LopdfCodec.load(&artifact.bytes).unwrap();
    assert_eq!(output.page_count(), 2);
    assert_eq!(output.page_size(2).unwrap(), SMALL);

    let result = verify_flattened(&artifact.bytes);
    assert!(result.ok, "{}", result.summary());

    // with nothing to paint, each page is exactly what the renderer produced
    for page_number in 1..=2 {
        let expected = opaque_rgb(&renderer.render_page(page_number, 2.0).unwrap());
        assert_eq!(page_raster(&artifact.bytes, page_number), expected);
    }
}

fn three_page_scenario(text_color: Rgb) -> (veil::ExportArtifact, FakeRenderer) {
    let letter = Size::new(612.0, 792.0);
    let source = sample_pdf(3, letter);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::discover(None, None));

    let mut store = AnnotationStore::new();
    store.add_redaction(RedactionBox::new(2, Rect::new(100.0, 100.0, 200.0, 50.0), FillColor::Black));
    store.add_text(
        TextAnnotation::new(2, Point::new(110.0, 110.0), "REDACTED")
            .with_style(14.0, text_color, false)
            .unwrap(),
    );

    let artifact = export(&renderer, &compositor, &source, &store, ExportMode::Secure).unwrap();
    assert_eq!(artifact.report.pages_written, 3);
    assert!(artifact.report.skipped_annotations.is_empty());
    assert!(verify_flattened(&artifact.bytes).ok);
    (artifact, renderer)
}

/// Pixels of the text line box at scale 2: x from the anchor, y from anchor to baseline
fn text_line_box() -> impl Iterator<Item = (u32, u32)> {
    (220..380).flat_map(|x| (220..248).map(move |y| (x, y)))
}

#[test]
fn test_black_text_over_black_redaction_on_second_of_three_pages() {
    let (artifact, renderer) = three_page_scenario(Rgb::BLACK);

    let untouched = page_raster(&artifact.bytes, 1);
    let page = page_raster(&artifact.bytes, 2);
    assert_eq!(page.dimensions(), (1224, 1584));
    assert_eq!(untouched, opaque_rgb(&renderer.render_page(1, 2.0).unwrap()));

    // the whole scaled box is black: fill plus black glyphs, no ink showing through
    for y in 200..300 {
        for x in 200..600 {
            assert_eq!(page.get_pixel(x, y).0, [0, 0, 0], "pixel ({x}, {y})");
        }
    }
    // directly outside the box the page is untouched
    assert_eq!(page.get_pixel(199, 250).0, [255, 255, 255]);
    assert_eq!(page.get_pixel(300, 300).0, [255, 255, 255]);
}

#[test]
fn test_black_text_glyphs_land_at_scaled_anchor() {
    let source = sample_pdf(3, Size::new(612.0, 792.0));
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::discover(None, None));

    let plain = export(&renderer, &compositor, &source, &AnnotationStore::new(), ExportMode::Secure).unwrap();
    let mut store = AnnotationStore::new();
    store.add_text(
        TextAnnotation::new(2, Point::new(110.0, 110.0), "REDACTED")
            .with_style(14.0, Rgb::BLACK, false)
            .unwrap(),
    );
    let with_text = export(&renderer, &compositor, &source, &store, ExportMode::Secure).unwrap();
    assert!(with_text.report.skipped_annotations.is_empty());

    let before = page_raster(&plain.bytes, 2);
    let after = page_raster(&with_text.bytes, 2);
    let changed: Vec<(u32, u32)> = after
        .enumerate_pixels()
        .filter(|&(x, y, p)| before.get_pixel(x, y) != p)
        .map(|(x, y, _)| (x, y))
        .collect();

    assert!(changed.len() > 50, "expected glyph pixels, found {}", changed.len());
    // every glyph pixel sits in the line box that starts at (220, 220)
    assert!(changed.iter().all(|&(x, y)| (218..400).contains(&x) && (215..252).contains(&y)));
    let darkest = changed.iter().map(|&(x, y)| after.get_pixel(x, y).0[0]).min();
    assert!(darkest.is_some_and(|value| value < 32), "glyph cores should be black");
}

#[test]
fn test_light_text_shows_on_redaction() {
    let (artifact, _) = three_page_scenario(Rgb::WHITE);
    let page = page_raster(&artifact.bytes, 2);

    let light = text_line_box().filter(|&(x, y)| page.get_pixel(x, y).0[0] > 128).count();
    assert!(light > 50, "expected glyph pixels at the scaled anchor, found {light}");
    // bottom edge of the box, below the text line
    assert_eq!(page.get_pixel(590, 295).0, [0, 0, 0]);
}

#[test]
fn test_out_of_range_annotations_are_counted() {
    let source = sample_pdf(5, SMALL);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::empty());

    let mut store = AnnotationStore::new();
    store.add_redaction(RedactionBox::new(99, Rect::new(0.0, 0.0, 50.0, 50.0), FillColor::Black));

    let artifact = export(&renderer, &compositor, &source, &store, ExportMode::Secure).unwrap();
    assert_eq!(artifact.report.page_count, 5);
    assert_eq!(artifact.report.pages_written, 5);
    assert_eq!(artifact.report.out_of_range_annotations, 1);
}

#[test]
fn test_failing_page_is_skipped_and_reported() {
    let source = sample_pdf(3, SMALL);
    let renderer = loaded(&source, FakeRenderer::failing_on(2));
    let compositor = Compositor::new(FontSet::empty());

    let artifact = export(&renderer, &compositor, &source, &AnnotationStore::new(), ExportMode::Secure).unwrap();

    assert_eq!(artifact.report.pages_written, 2);
    assert_eq!(artifact.report.skipped_pages.len(), 1);
    assert_eq!(artifact.report.skipped_pages[0].page_number, 2);
    assert_eq!(LopdfCodec.load(&artifact.bytes).unwrap().page_count(), 2);
    assert_eq!(artifact.report.verified, Some(true));
}

#[test]
fn test_export_fails_when_no_page_renders() {
    let source = sample_pdf(1, SMALL);
    let renderer = loaded(&source, FakeRenderer::failing_on(1));
    let compositor = Compositor::new(FontSet::empty());

    let err = export(&renderer, &compositor, &source, &AnnotationStore::new(), ExportMode::Secure).unwrap_err();
    assert!(matches!(err, VeilError::Export(msg) if msg == "no page could be rendered"));
}

#[test]
fn test_placed_image_is_flattened() {
    let source = sample_pdf(1, SMALL);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::empty());

    let mut store = AnnotationStore::new();
    store.add_image(
        ImageAnnotation::new(1, Rect::new(200.0, 200.0, 40.0, 40.0), png(8, 8, [0, 0, 255, 255])).unwrap(),
    );
    let artifact = export(&renderer, &compositor, &source, &store, ExportMode::Secure).unwrap();

    let page = page_raster(&artifact.bytes, 1);
    assert_eq!(page.get_pixel(440, 440).0, [0, 0, 255]);
    assert!(verify_flattened(&artifact.bytes).ok);
}

#[test]
fn test_overlay_keeps_original_content() {
    let source = sample_pdf(2, SMALL);
    let renderer = loaded(&source, FakeRenderer::default());
    let compositor = Compositor::new(FontSet::empty());

    let mut store = AnnotationStore::new();
    store.add_redaction(RedactionBox::new(1, Rect::new(100.0, 100.0, 200.0, 50.0), FillColor::Black));
    store.add_text(TextAnnotation::new(2, Point::new(10.0, 10.0), "note"));

    let artifact = export(&renderer, &compositor, &source, &store, ExportMode::Overlay).unwrap();

    assert_eq!(artifact.report.mode, ExportMode::Overlay);
    assert_eq!(artifact.report.verified, None);
    assert_eq!(artifact.report.pages_written, 2);
    assert_eq!(LopdfCodec.load(&artifact.bytes).unwrap().page_count(), 2);
    // the source text and its font are still there
    assert!(!verify_flattened(&artifact.bytes).ok);
}
