//! Ken-Burns push-in and fade math, sampled per output frame.

use image::{RgbImage, imageops::FilterType};

use crate::config::RenderConfig;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{SlideError, SlideResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Zero disables the push-in.
    pub zoom_rate_per_sec: f64,
    /// Zero disables the fade-in.
    pub fade_in_sec: f64,
}

impl Motion {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        Self {
            zoom_rate_per_sec: if cfg.zoom { cfg.zoom_rate_per_sec } else { 0.0 },
            fade_in_sec: cfg.crossfade_sec,
        }
    }

    pub fn still() -> Self {
        Self {
            zoom_rate_per_sec: 0.0,
            fade_in_sec: 0.0,
        }
    }

    /// `1 + rate * t`.
    pub fn scale_at(&self, t: f64) -> f64 {
        1.0 + self.zoom_rate_per_sec * t.max(0.0)
    }

    /// Opacity of the clip at `t`, ramping linearly from 0 to 1 over the fade window.
    pub fn fade_in_alpha(&self, t: f64) -> f32 {
        if self.fade_in_sec <= 0.0 {
            return 1.0;
        }
        (t.max(0.0) / self.fade_in_sec).min(1.0) as f32
    }

    pub fn scale_at_frame(&self, frame: u64, fps: Fps) -> f64 {
        self.scale_at(fps.frames_to_secs(frame))
    }

    pub fn fade_in_alpha_at_frame(&self, frame: u64, fps: Fps) -> f32 {
        self.fade_in_alpha(fps.frames_to_secs(frame))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Centred window of size `frame / scale`, never smaller than 2x2 nor larger than the frame.
pub fn center_crop(frame: Resolution, scale: f64) -> CropWindow {
    let scale = if scale.is_finite() { scale.max(1.0) } else { 1.0 };
    let width = ((f64::from(frame.width) / scale).round() as u32).clamp(2.min(frame.width), frame.width);
    let height =
        ((f64::from(frame.height) / scale).round() as u32).clamp(2.min(frame.height), frame.height);
    CropWindow {
        x: (frame.width - width) / 2,
        y: (frame.height - height) / 2,
        width,
        height,
    }
}

/// Crop the centre of `still` by `scale` and resize it back to the still's own size.
pub fn zoomed_frame(still: &RgbImage, scale: f64) -> RgbImage {
    let frame = Resolution::new(still.width(), still.height());
    let win = center_crop(frame, scale);
    if win.width == frame.width && win.height == frame.height {
        return still.clone();
    }
    let cropped = image::imageops::crop_imm(still, win.x, win.y, win.width, win.height).to_image();
    image::imageops::resize(&cropped, frame.width, frame.height, FilterType::Triangle)
}

/// `dst = under * (1 - alpha) + dst * alpha`.
pub fn fade_over(dst: &mut RgbImage, under: &RgbImage, alpha: f32) -> SlideResult<()> {
    if dst.dimensions() != under.dimensions() {
        return Err(SlideError::validation(format!(
            "fade expects equal frame sizes, got {:?} and {:?}",
            dst.dimensions(),
            under.dimensions()
        )));
    }
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha >= 1.0 {
        return Ok(());
    }
    let a = ((alpha * 255.0).round() as i32).clamp(0, 255) as u16;
    let ia = 255 - a;
    for (d, u) in dst.as_mut().iter_mut().zip(under.as_raw().iter()) {
        *d = add_sat_u8(mul_div255(u16::from(*d), a), mul_div255(u16::from(*u), ia));
    }
    Ok(())
}

/// Scale every channel towards black.
pub fn fade_from_black(frame: &mut RgbImage, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha >= 1.0 {
        return;
    }
    let a = ((alpha * 255.0).round() as i32).clamp(0, 255) as u16;
    for c in frame.as_mut().iter_mut() {
        *c = mul_div255(u16::from(*c), a);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/clip/motion.rs"]
mod tests;
