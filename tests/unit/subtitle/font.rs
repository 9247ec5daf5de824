use super::*;

#[test]
fn default_chain_orders_bundled_platform_generic() {
    let chain = default_chain(Some(PathBuf::from("font.ttf")), "Noto Sans CJK SC");
    assert_eq!(
        chain,
        vec![
            FontSource::Bundled(PathBuf::from("font.ttf")),
            FontSource::Platform("Noto Sans CJK SC".to_string()),
            FontSource::Generic,
        ]
    );
    assert_eq!(default_chain(None, " "), vec![FontSource::Generic]);
}

#[test]
fn corrupt_bundled_font_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("font.ttf");
    std::fs::write(&bad, b"this is not a font").unwrap();

    let fonts = resolve_chain(&[FontSource::Bundled(bad)]);
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].tier, FontTier::Glyphless);
    assert!(!fonts[0].has_glyphs());
}

#[test]
fn chain_always_yields_at_least_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = resolve_chain(&default_chain(
        Some(dir.path().join("missing.ttf")),
        "Surely Not An Installed Family 123",
    ));
    assert!(!fonts.is_empty());
    assert!(
        fonts
            .iter()
            .all(|f| f.tier != FontTier::Bundled && f.tier != FontTier::Platform)
    );
}
