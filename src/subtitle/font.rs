//! Ordered font sources for subtitle rendering.
//!
//! Each source is probed on its own database so a broken bundled file cannot poison the
//! platform fonts. Resolution never fails: when nothing yields a face the chain still
//! returns a glyph-less entry and the compositor degrades to an empty plate.

use std::path::PathBuf;
use std::sync::Arc;

use usvg::fontdb;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// Font file shipped with the deployment.
    Bundled(PathBuf),
    /// Named family installed on the host.
    Platform(String),
    /// Any sans-serif face the host has, then any face at all.
    Generic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontTier {
    Bundled,
    Platform,
    Generic,
    /// No usable face anywhere.
    Glyphless,
}

#[derive(Clone)]
pub struct ResolvedFont {
    pub tier: FontTier,
    pub family: String,
    pub db: Arc<fontdb::Database>,
}

impl ResolvedFont {
    pub fn glyphless() -> Self {
        Self {
            tier: FontTier::Glyphless,
            family: "sans-serif".to_string(),
            db: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn has_glyphs(&self) -> bool {
        self.tier != FontTier::Glyphless && self.db.len() > 0
    }
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("tier", &self.tier)
            .field("family", &self.family)
            .field("faces", &self.db.len())
            .finish()
    }
}

/// Bundled file (if configured), then the platform family, then anything generic.
pub fn default_chain(bundled: Option<PathBuf>, platform_family: &str) -> Vec<FontSource> {
    let mut chain = Vec::with_capacity(3);
    if let Some(path) = bundled {
        chain.push(FontSource::Bundled(path));
    }
    if !platform_family.trim().is_empty() {
        chain.push(FontSource::Platform(platform_family.trim().to_string()));
    }
    chain.push(FontSource::Generic);
    chain
}

/// Probe every source and return the usable ones in chain order, always non-empty.
pub fn resolve_chain(chain: &[FontSource]) -> Vec<ResolvedFont> {
    let mut system: Option<Arc<fontdb::Database>> = None;
    let mut out = Vec::new();

    for source in chain {
        match source {
            FontSource::Bundled(path) => match load_bundled(path) {
                Some(font) => out.push(font),
                None => tracing::warn!(path = %path.display(), "bundled font unusable, trying next source"),
            },
            FontSource::Platform(name) => {
                let db = system.get_or_insert_with(load_system).clone();
                let families = [fontdb::Family::Name(name.as_str())];
                match query_family(&db, &families) {
                    Some(family) => out.push(ResolvedFont {
                        tier: FontTier::Platform,
                        family,
                        db,
                    }),
                    None => tracing::warn!(family = %name, "platform font not installed"),
                }
            }
            FontSource::Generic => {
                let db = system.get_or_insert_with(load_system).clone();
                let family = query_family(&db, &[fontdb::Family::SansSerif])
                    .or_else(|| first_family(&db));
                if let Some(family) = family {
                    out.push(ResolvedFont {
                        tier: FontTier::Generic,
                        family,
                        db,
                    });
                }
            }
        }
    }

    if out.is_empty() {
        tracing::warn!("no font faces available; subtitles will render without glyphs");
        out.push(ResolvedFont::glyphless());
    }
    out
}

fn load_bundled(path: &std::path::Path) -> Option<ResolvedFont> {
    if !path.is_file() {
        return None;
    }
    let mut db = fontdb::Database::new();
    if let Err(err) = db.load_font_file(path) {
        tracing::warn!(path = %path.display(), %err, "failed to read bundled font");
        return None;
    }
    // fontdb skips faces it cannot parse, so a corrupt file loads as an empty database.
    let family = first_family(&db)?;
    Some(ResolvedFont {
        tier: FontTier::Bundled,
        family,
        db: Arc::new(db),
    })
}

fn load_system() -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}

fn query_family(db: &fontdb::Database, families: &[fontdb::Family<'_>]) -> Option<String> {
    let query = fontdb::Query {
        families,
        weight: fontdb::Weight::BOLD,
        ..fontdb::Query::default()
    };
    let id = db.query(&query)?;
    db.face(id)
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
}

fn first_family(db: &fontdb::Database) -> Option<String> {
    db.faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
}

/// Resolver that never lets a missing named family drop the text: it widens the query to
/// the generic families and finally to any face in the database.
pub(crate) fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                });
            }
            families.push(fontdb::Family::SansSerif);
            families.push(fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };
            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch: fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/subtitle/font.rs"]
mod tests;
