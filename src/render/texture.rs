//! GPU texture cache for material texture references.
//!
//! Textures are keyed by a content hash of the source file, so two
//! materials referencing the same image (or the same image under two
//! paths) share one GPU texture, and editing a file on disk changes the
//! key rather than silently reusing stale pixels.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct TextureCache {
    entries: HashMap<String, Arc<wgpu::BindGroup>>,
    failed_paths: HashSet<String>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            failed_paths: HashSet::new(),
        }
    }

    /// Loads (or retrieves) the bind group for a texture path. Returns
    /// `None` on any failure; failures warn once per path and the caller
    /// falls back to the untextured bind group.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        path: &str,
    ) -> Option<Arc<wgpu::BindGroup>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if self.failed_paths.insert(path.to_string()) {
                    log::warn!("Failed to read texture {}: {}", path, err);
                }
                return None;
            }
        };
        let key = content_key(&bytes);
        if let Some(entry) = self.entries.get(&key) {
            return Some(entry.clone());
        }

        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image.to_rgba8(),
            Err(err) => {
                if self.failed_paths.insert(path.to_string()) {
                    log::warn!("Failed to decode texture {}: {}", path, err);
                }
                return None;
            }
        };
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("material_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_texture_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));

        log::info!("Loaded texture {} ({}x{}, key {})", path, width, height, &key[..12]);
        self.entries.insert(key.clone(), bind_group);
        self.failed_paths.remove(path);
        self.entries.get(&key).cloned()
    }
}

/// Stable cache key for a texture's source bytes.
pub fn content_key(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        key.push_str(&format!("{:02x}", byte));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::content_key;

    #[test]
    fn content_key_is_stable_and_distinct() {
        let a = content_key(b"brick wall");
        let b = content_key(b"brick wall");
        let c = content_key(b"plaster");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
