//! Project thumbnails.
//!
//! A thumbnail is a small top-down rasterization of the scene: each
//! visible object's footprint on the ground plane, filled with its
//! resolved material color. No GPU readback involved, so thumbnails can
//! be produced anywhere the scene state is available.

use crate::scene::SceneState;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glam::Vec3;
use image::{Rgba, RgbaImage};
use std::io::Cursor;

pub const THUMB_WIDTH: u32 = 160;
pub const THUMB_HEIGHT: u32 = 120;

const BACKGROUND: Rgba<u8> = Rgba([38, 40, 48, 255]);

/// Renders the footprint thumbnail and returns it as base64-encoded PNG,
/// ready to store on a project record.
pub fn render_png_base64(scene: &SceneState) -> Result<String, image::ImageError> {
    let image = render(scene);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(STANDARD.encode(bytes))
}

/// Decodes a stored thumbnail back to RGBA pixels, for display in the
/// project list. Returns `(width, height, rgba)`.
pub fn decode_png_base64(data: &str) -> Option<(u32, u32, Vec<u8>)> {
    let bytes = STANDARD.decode(data).ok()?;
    let image = image::load_from_memory(&bytes).ok()?.to_rgba8();
    let (width, height) = image.dimensions();
    Some((width, height, image.into_raw()))
}

pub fn render(scene: &SceneState) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(THUMB_WIDTH, THUMB_HEIGHT, BACKGROUND);

    let (center, extent) = scene.bounds();
    // Uniform world-to-pixel scale with a margin, so footprints keep
    // their aspect ratio.
    let span = extent.max_element().max(1.0) * 2.2;
    let scale = (THUMB_HEIGHT.min(THUMB_WIDTH) as f32) / span;

    for object in scene.objects() {
        if !object.visible {
            continue;
        }
        let color = scene.resolve_material(object).base_color;
        let pixel = Rgba([
            (color[0].clamp(0.0, 1.0) * 255.0) as u8,
            (color[1].clamp(0.0, 1.0) * 255.0) as u8,
            (color[2].clamp(0.0, 1.0) * 255.0) as u8,
            255,
        ]);

        let half = Vec3::from_array(object.primitive.half_extents());
        let model = object.transform.matrix();
        // Project the object's bounding corners onto the XZ plane.
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_z = f32::MAX;
        let mut max_z = f32::MIN;
        for sx in [-1.0f32, 1.0] {
            for sy in [-1.0f32, 1.0] {
                for sz in [-1.0f32, 1.0] {
                    let world = model.transform_point3(Vec3::new(sx, sy, sz) * half);
                    min_x = min_x.min(world.x);
                    max_x = max_x.max(world.x);
                    min_z = min_z.min(world.z);
                    max_z = max_z.max(world.z);
                }
            }
        }

        let to_px = |x: f32, z: f32| -> (i64, i64) {
            (
                ((x - center.x) * scale + THUMB_WIDTH as f32 * 0.5) as i64,
                ((z - center.z) * scale + THUMB_HEIGHT as f32 * 0.5) as i64,
            )
        };
        let (x0, y0) = to_px(min_x, min_z);
        let (x1, y1) = to_px(max_x, max_z);
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                if x >= 0 && y >= 0 && (x as u32) < THUMB_WIDTH && (y as u32) < THUMB_HEIGHT {
                    image.put_pixel(x as u32, y as u32, pixel);
                }
            }
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PrimitiveKind, SceneState};

    #[test]
    fn thumbnail_has_fixed_dimensions() {
        let image = render(&SceneState::new());
        assert_eq!(image.dimensions(), (THUMB_WIDTH, THUMB_HEIGHT));
    }

    #[test]
    fn objects_leave_a_footprint() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.edit_object_material(id, |material| {
            material.base_color = [1.0, 0.0, 0.0, 1.0];
        });
        let image = render(&scene);
        let center = image.get_pixel(THUMB_WIDTH / 2, THUMB_HEIGHT / 2);
        assert_eq!(center.0, [255, 0, 0, 255]);
    }

    #[test]
    fn hidden_objects_are_skipped() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.set_visible(id, false);
        let image = render(&scene);
        let center = image.get_pixel(THUMB_WIDTH / 2, THUMB_HEIGHT / 2);
        assert_eq!(*center, BACKGROUND);
    }

    #[test]
    fn base64_output_decodes_as_png() {
        let mut scene = SceneState::new();
        scene.add_object(PrimitiveKind::sphere());
        let encoded = render_png_base64(&scene).unwrap();
        let bytes = STANDARD.decode(&encoded).unwrap();
        // PNG magic header.
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

        let (width, height, rgba) = decode_png_base64(&encoded).unwrap();
        assert_eq!((width, height), (THUMB_WIDTH, THUMB_HEIGHT));
        assert_eq!(rgba.len(), (THUMB_WIDTH * THUMB_HEIGHT * 4) as usize);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_png_base64("not base64 at all!").is_none());
        assert!(decode_png_base64("aGVsbG8=").is_none());
    }
}
