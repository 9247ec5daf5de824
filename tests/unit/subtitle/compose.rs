use super::*;

fn compositor(style: SubtitleStyle) -> SubtitleCompositor {
    SubtitleCompositor::new(
        Resolution::new(640, 360),
        &SubtitleConfig::default(),
        style,
        vec![ResolvedFont::glyphless()],
    )
}

fn gray(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([128, 128, 128])))
}

#[test]
fn output_matches_target_resolution_regardless_of_source_aspect() {
    let comp = compositor(SubtitleStyle::Stroke);
    for (w, h) in [(1024, 576), (300, 900), (17, 5)] {
        let out = comp.compose(&gray(w, h), "hello").unwrap();
        assert_eq!(out.dimensions(), (640, 360));
    }
}

#[test]
fn blank_narration_leaves_resized_still_untouched() {
    let comp = compositor(SubtitleStyle::Plate);
    let out = comp.compose(&gray(640, 360), "  \n ").unwrap();
    assert!(out.pixels().all(|p| p.0 == [128, 128, 128]));
}

#[test]
fn glyphless_plate_style_still_draws_plate_near_bottom() {
    let comp = compositor(SubtitleStyle::Plate);
    let out = comp.compose(&gray(640, 360), "今天天气很好").unwrap();

    let x = 320;
    let bottom_of_block = (360.0 - comp.margin_px()) as u32;
    let inside = out.get_pixel(x, bottom_of_block - 2);
    assert!(inside[0] < 128, "plate should darken the block area: {inside:?}");

    let top = out.get_pixel(x, 10);
    assert_eq!(top.0, [128, 128, 128]);
}

#[test]
fn glyphless_stroke_style_degrades_to_bare_still() {
    let comp = compositor(SubtitleStyle::Stroke);
    let out = comp.compose(&gray(640, 360), "no font anywhere").unwrap();
    assert!(out.pixels().all(|p| p.0 == [128, 128, 128]));
}

#[test]
fn empty_font_list_behaves_like_glyphless() {
    let comp = SubtitleCompositor::new(
        Resolution::new(640, 360),
        &SubtitleConfig::default(),
        SubtitleStyle::Plate,
        Vec::new(),
    );
    assert!(comp.compose(&gray(64, 36), "text").is_ok());
}

#[test]
fn font_size_and_margin_scale_with_frame_height() {
    let comp = compositor(SubtitleStyle::Stroke);
    assert_eq!(comp.font_px(), (360.0f32 * 0.095).round());
    assert_eq!(comp.margin_px(), (360.0f32 * 0.17).round());
}

#[test]
fn block_is_centred_and_rests_above_bottom_margin() {
    let frame = Resolution::new(1000, 500);
    let block = TextBox {
        x: -100.0,
        y: 10.0,
        width: 200.0,
        height: 50.0,
    };
    let p = place_block(frame, block, 80.0);
    assert_eq!(p.scale, 1.0);
    assert_eq!(p.frame_box.x, 400.0);
    assert_eq!(p.frame_box.y + p.frame_box.height, 420.0);
    assert_eq!(block.x * p.scale + p.tx, p.frame_box.x);
    assert_eq!(block.y * p.scale + p.ty, p.frame_box.y);
}

#[test]
fn oversized_block_is_scaled_to_fit_width() {
    let frame = Resolution::new(1000, 500);
    let block = TextBox {
        x: -1000.0,
        y: 0.0,
        width: 2000.0,
        height: 40.0,
    };
    let p = place_block(frame, block, 50.0);
    assert!(p.scale < 1.0);
    assert!((p.frame_box.width - 920.0).abs() < 1e-3);
    assert!(p.frame_box.x >= 0.0);
    assert!(p.frame_box.x + p.frame_box.width <= 1000.0);
}

#[test]
fn xml_special_characters_are_escaped() {
    assert_eq!(escape_xml(r#"a<b & "c">'"#), "a&lt;b &amp; &quot;c&quot;&gt;&apos;");
}
