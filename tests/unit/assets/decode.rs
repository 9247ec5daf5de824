use super::*;

#[test]
fn decode_png_bytes() {
    let img = image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_still_bytes(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));
    assert_eq!(decoded.to_rgb8().get_pixel(3, 1).0, [10, 20, 30]);
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_still_bytes(b"definitely not an image").is_err());
}

#[test]
fn truncated_file_is_a_media_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene_1_x.jpg");
    std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();
    let err = decode_still(&path).unwrap_err();
    assert!(matches!(err, SlideError::Media(_)), "{err}");
}
