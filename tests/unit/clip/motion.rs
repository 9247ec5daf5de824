use super::*;

#[test]
fn scale_grows_linearly_with_time() {
    let m = Motion {
        zoom_rate_per_sec: 0.04,
        fade_in_sec: 0.3,
    };
    assert_eq!(m.scale_at(0.0), 1.0);
    assert!((m.scale_at(5.0) - 1.2).abs() < 1e-12);
    assert!(m.scale_at(2.0) < m.scale_at(2.1));
    assert_eq!(m.scale_at(-1.0), 1.0);
}

#[test]
fn fade_alpha_ramps_then_saturates() {
    let m = Motion {
        zoom_rate_per_sec: 0.0,
        fade_in_sec: 0.3,
    };
    assert_eq!(m.fade_in_alpha(0.0), 0.0);
    assert!((m.fade_in_alpha(0.15) - 0.5).abs() < 1e-6);
    assert_eq!(m.fade_in_alpha(0.3), 1.0);
    assert_eq!(m.fade_in_alpha(10.0), 1.0);
    assert_eq!(Motion::still().fade_in_alpha(0.0), 1.0);
}

#[test]
fn disabled_zoom_in_config_means_zero_rate() {
    let cfg = RenderConfig {
        zoom: false,
        ..RenderConfig::default()
    };
    assert_eq!(Motion::from_config(&cfg).scale_at(100.0), 1.0);
}

#[test]
fn crop_window_is_centred_and_shrinks_with_scale() {
    let frame = Resolution::new(1000, 500);
    assert_eq!(
        center_crop(frame, 1.0),
        CropWindow {
            x: 0,
            y: 0,
            width: 1000,
            height: 500
        }
    );
    let w = center_crop(frame, 1.25);
    assert_eq!((w.width, w.height), (800, 400));
    assert_eq!((w.x, w.y), (100, 50));
    assert_eq!(center_crop(frame, 0.5), center_crop(frame, 1.0));
}

#[test]
fn zoomed_frame_keeps_frame_size_and_pushes_in() {
    // A thin red strip on the left edge falls outside the crop window once zoomed.
    let still = RgbImage::from_fn(40, 20, |x, _| {
        if x < 4 {
            image::Rgb([255, 0, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    });
    let out = zoomed_frame(&still, 1.5);
    assert_eq!(out.dimensions(), (40, 20));
    assert_eq!(out.get_pixel(0, 10).0, [0, 0, 255]);
    assert_eq!(zoomed_frame(&still, 1.0), still);
}

#[test]
fn fade_over_endpoints() {
    let under = RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
    let mut top = RgbImage::from_pixel(2, 2, image::Rgb([200, 100, 50]));
    fade_over(&mut top, &under, 1.0).unwrap();
    assert_eq!(top.get_pixel(0, 0).0, [200, 100, 50]);

    let mut top = RgbImage::from_pixel(2, 2, image::Rgb([200, 100, 50]));
    fade_over(&mut top, &under, 0.0).unwrap();
    assert_eq!(top.get_pixel(0, 0).0, [0, 0, 0]);

    let under = RgbImage::from_pixel(2, 2, image::Rgb([100, 100, 100]));
    let mut top = RgbImage::from_pixel(2, 2, image::Rgb([200, 200, 200]));
    fade_over(&mut top, &under, 0.5).unwrap();
    let v = top.get_pixel(1, 1)[0];
    assert!((149..=151).contains(&v), "{v}");
}

#[test]
fn fade_over_rejects_mismatched_sizes() {
    let under = RgbImage::new(2, 2);
    let mut top = RgbImage::new(4, 2);
    assert!(fade_over(&mut top, &under, 0.5).is_err());
}

#[test]
fn fade_from_black_scales_channels() {
    let mut f = RgbImage::from_pixel(1, 1, image::Rgb([255, 128, 0]));
    fade_from_black(&mut f, 0.0);
    assert_eq!(f.get_pixel(0, 0).0, [0, 0, 0]);
    let mut f = RgbImage::from_pixel(1, 1, image::Rgb([255, 128, 0]));
    fade_from_black(&mut f, 1.0);
    assert_eq!(f.get_pixel(0, 0).0, [255, 128, 0]);
}
