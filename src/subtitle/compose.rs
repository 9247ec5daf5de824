use image::{DynamicImage, RgbImage, imageops::FilterType};
use resvg::tiny_skia;

use crate::config::{RenderConfig, SubtitleConfig, SubtitleStyle};
use crate::foundation::core::Resolution;
use crate::foundation::error::{SlideError, SlideResult};
use crate::subtitle::font::{self, ResolvedFont};
use crate::subtitle::wrap::{ScriptClass, WrapBudget, classify, wrap_lines};

/// Widest a subtitle block may get, as a fraction of frame width.
pub const MAX_BLOCK_WIDTH_FRAC: f32 = 0.92;

/// Axis-aligned box in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where a measured text block lands on the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Uniform scale applied to the block (< 1 only when it would not fit).
    pub scale: f32,
    /// Translation applied after scaling, mapping block space to frame space.
    pub tx: f32,
    pub ty: f32,
    /// The block's final bounds on the frame.
    pub frame_box: TextBox,
}

/// Center `block` horizontally and rest its bottom edge `margin_px` above the frame bottom.
pub fn place_block(frame: Resolution, block: TextBox, margin_px: f32) -> Placement {
    let fw = frame.width as f32;
    let fh = frame.height as f32;
    let max_w = fw * MAX_BLOCK_WIDTH_FRAC;
    let scale = if block.width > max_w && block.width > 0.0 {
        max_w / block.width
    } else {
        1.0
    };
    let w = block.width * scale;
    let h = block.height * scale;
    let x = (fw - w) / 2.0;
    let y = (fh - margin_px - h).max(0.0);
    Placement {
        scale,
        tx: x - block.x * scale,
        ty: y - block.y * scale,
        frame_box: TextBox {
            x,
            y,
            width: w,
            height: h,
        },
    }
}

/// Burns narration onto stills at the run's target resolution.
#[derive(Debug)]
pub struct SubtitleCompositor {
    resolution: Resolution,
    style: SubtitleStyle,
    fonts: Vec<ResolvedFont>,
    budget: WrapBudget,
    font_px: f32,
    margin_px: f32,
    stroke_px: f32,
    line_height: f32,
    plate_alpha: u8,
}

struct MeasuredBlock {
    tree: Option<usvg::Tree>,
    bounds: TextBox,
}

impl SubtitleCompositor {
    /// `fonts` is tried in order; an empty list behaves like a single glyph-less font.
    pub fn new(
        resolution: Resolution,
        cfg: &SubtitleConfig,
        style: SubtitleStyle,
        mut fonts: Vec<ResolvedFont>,
    ) -> Self {
        if fonts.is_empty() {
            fonts.push(ResolvedFont::glyphless());
        }
        let font_px = (resolution.height as f32 * cfg.font_size_ratio).round().max(8.0);
        Self {
            resolution,
            style,
            fonts,
            budget: WrapBudget {
                logographic: cfg.max_chars_logographic,
                spaced: cfg.max_chars_spaced,
            },
            font_px,
            margin_px: (resolution.height as f32 * cfg.bottom_margin_ratio).round(),
            stroke_px: (font_px * cfg.stroke_ratio).max(1.0),
            line_height: cfg.line_height.max(1.0),
            plate_alpha: cfg.plate_alpha,
        }
    }

    /// Resolve the configured font chain and build a compositor for the run.
    #[tracing::instrument(skip(cfg))]
    pub fn from_config(cfg: &RenderConfig, bundled_font: Option<std::path::PathBuf>) -> Self {
        let chain = font::default_chain(bundled_font, &cfg.subtitle.platform_family);
        let fonts = font::resolve_chain(&chain);
        if let Some(first) = fonts.first() {
            tracing::info!(tier = ?first.tier, family = %first.family, "subtitle font resolved");
        }
        Self::new(
            cfg.resolution(),
            &cfg.subtitle,
            cfg.subtitle_style(),
            fonts,
        )
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn font_px(&self) -> f32 {
        self.font_px
    }

    pub fn margin_px(&self) -> f32 {
        self.margin_px
    }

    /// Hard-resize `image` to the target resolution (aspect is not preserved) and draw the
    /// wrapped narration near the bottom. The result is opaque RGB.
    pub fn compose(&self, image: &DynamicImage, narration: &str) -> SlideResult<RgbImage> {
        let base = image
            .resize_exact(
                self.resolution.width,
                self.resolution.height,
                FilterType::Lanczos3,
            )
            .to_rgb8();
        let lines = wrap_lines(narration, self.budget);
        if lines.is_empty() {
            return Ok(base);
        }

        let mut last_err = None;
        for (i, font) in self.fonts.iter().enumerate() {
            let is_last = i + 1 == self.fonts.len();
            match self.draw(&base, narration, &lines, font, is_last) {
                Ok(img) => return Ok(img),
                Err(err) => {
                    tracing::warn!(family = %font.family, %err, "subtitle draw failed, trying next font");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| SlideError::composite("no font sources")))
    }

    fn draw(
        &self,
        base: &RgbImage,
        narration: &str,
        lines: &[String],
        font: &ResolvedFont,
        accept_glyphless: bool,
    ) -> SlideResult<RgbImage> {
        let block = self.measure(narration, lines, font, accept_glyphless)?;
        let placement = place_block(self.resolution, block.bounds, self.margin_px);
        let mut pixmap = pixmap_from_rgb(base)?;

        if self.style == SubtitleStyle::Plate {
            let pad = self.font_px * 0.35;
            let b = placement.frame_box;
            if let Some(rect) = tiny_skia::Rect::from_xywh(
                b.x - pad,
                b.y - pad,
                b.width + 2.0 * pad,
                b.height + 2.0 * pad,
            ) {
                let mut paint = tiny_skia::Paint::default();
                paint.set_color_rgba8(0, 0, 0, self.plate_alpha);
                paint.anti_alias = true;
                pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
            }
        }

        if let Some(tree) = &block.tree {
            let xform = tiny_skia::Transform::from_row(
                placement.scale,
                0.0,
                0.0,
                placement.scale,
                placement.tx,
                placement.ty,
            );
            resvg::render(tree, xform, &mut pixmap.as_mut());
        }

        rgb_from_pixmap(&pixmap)
    }

    fn measure(
        &self,
        narration: &str,
        lines: &[String],
        font: &ResolvedFont,
        accept_glyphless: bool,
    ) -> SlideResult<MeasuredBlock> {
        if font.has_glyphs() {
            let svg = self.text_svg(lines, &font.family);
            let opts = usvg::Options {
                fontdb: font.db.clone(),
                font_resolver: font::make_font_resolver(),
                font_family: font.family.clone(),
                ..usvg::Options::default()
            };
            let tree = usvg::Tree::from_str(&svg, &opts)
                .map_err(|e| SlideError::composite(format!("subtitle svg: {e}")))?;
            if !tree.root().children().is_empty() {
                let bbox = match self.style {
                    SubtitleStyle::Stroke => tree.root().abs_stroke_bounding_box(),
                    SubtitleStyle::Plate => tree.root().abs_bounding_box(),
                };
                if bbox.width() > 0.0 && bbox.height() > 0.0 {
                    return Ok(MeasuredBlock {
                        bounds: TextBox {
                            x: bbox.x(),
                            y: bbox.y(),
                            width: bbox.width(),
                            height: bbox.height(),
                        },
                        tree: Some(tree),
                    });
                }
            }
            if !accept_glyphless {
                return Err(SlideError::composite(format!(
                    "font '{}' produced no glyphs",
                    font.family
                )));
            }
        }

        Ok(MeasuredBlock {
            tree: None,
            bounds: self.estimate_bounds(narration, lines),
        })
    }

    /// Block size from character counts, used when no face could shape the text.
    fn estimate_bounds(&self, narration: &str, lines: &[String]) -> TextBox {
        let advance = match classify(narration) {
            ScriptClass::Logographic => 1.0,
            ScriptClass::Spaced => 0.55,
        };
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f32;
        let width = widest * self.font_px * advance;
        let height = self.font_px * (1.0 + (lines.len().saturating_sub(1) as f32) * self.line_height);
        TextBox {
            x: -width / 2.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Lines centred on x = 0, first baseline at one font size below y = 0.
    fn text_svg(&self, lines: &[String], family: &str) -> String {
        let family = family.replace(['\'', '"', '<', '>', '&'], "");
        let mut tspans = String::new();
        for (i, line) in lines.iter().enumerate() {
            let y = self.font_px * (1.0 + i as f32 * self.line_height);
            tspans.push_str(&format!(
                r#"<tspan x="0" y="{y:.2}">{}</tspan>"#,
                escape_xml(line)
            ));
        }

        let common = format!(
            r#"font-family="'{family}', sans-serif" font-size="{:.2}" font-weight="bold" text-anchor="middle""#,
            self.font_px
        );
        let outline = match self.style {
            SubtitleStyle::Stroke => format!(
                r##"<text {common} fill="#000000" stroke="#000000" stroke-width="{:.2}" stroke-linejoin="round">{tspans}</text>"##,
                self.stroke_px * 2.0
            ),
            SubtitleStyle::Plate => String::new(),
        };
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{outline}<text {common} fill="#ffffff">{tspans}</text></svg>"##,
            w = self.resolution.width,
            h = self.resolution.height,
        )
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn pixmap_from_rgb(img: &RgbImage) -> SlideResult<tiny_skia::Pixmap> {
    let (w, h) = img.dimensions();
    let mut data = Vec::with_capacity(w as usize * h as usize * 4);
    for px in img.pixels() {
        data.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    let size = tiny_skia::IntSize::from_wh(w, h)
        .ok_or_else(|| SlideError::composite("invalid pixmap size"))?;
    tiny_skia::Pixmap::from_vec(data, size)
        .ok_or_else(|| SlideError::composite("failed to allocate subtitle pixmap"))
}

/// Drop alpha. The base is opaque, so premultiplied and straight channels agree.
fn rgb_from_pixmap(pixmap: &tiny_skia::Pixmap) -> SlideResult<RgbImage> {
    let mut out = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for px in pixmap.data().chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    RgbImage::from_raw(pixmap.width(), pixmap.height(), out)
        .ok_or_else(|| SlideError::composite("subtitle raster size mismatch"))
}

#[cfg(test)]
#[path = "../../tests/unit/subtitle/compose.rs"]
mod tests;
