//! Image decoding and texture upload.

use std::path::{Path, PathBuf};

/// RGBA pixels used when an image cannot be loaded.
pub const FALLBACK_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Format of every sampled colour texture.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cube face '{path}' is {width}x{height}, expected {expected}x{expected}")]
    FaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Tightly packed RGBA8 pixel data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    /// One entry per layer.
    pub layers: Vec<Vec<u8>>,
}

impl Pixels {
    pub fn fallback(layers: usize) -> Self {
        Self {
            width: 1,
            height: 1,
            layers: vec![FALLBACK_PIXEL.to_vec(); layers],
        }
    }
}

pub fn decode_image(path: &Path) -> Result<Pixels, TextureLoadError> {
    let image = image::open(path)
        .map_err(|source| TextureLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Pixels {
        width,
        height,
        layers: vec![image.into_raw()],
    })
}

/// Decode six square faces of equal size.
pub fn decode_cube(paths: &[PathBuf; 6]) -> Result<Pixels, TextureLoadError> {
    let mut faces = Vec::with_capacity(6);
    let mut size = None;
    for path in paths {
        let face = decode_image(path)?;
        let expected = *size.get_or_insert(face.width);
        if face.width != expected || face.height != expected {
            return Err(TextureLoadError::FaceSize {
                path: path.clone(),
                width: face.width,
                height: face.height,
                expected,
            });
        }
        faces.extend(face.layers);
    }
    let side = size.unwrap_or(1);
    Ok(Pixels {
        width: side,
        height: side,
        layers: faces,
    })
}

/// Upload `pixels` as a 2D texture, or a cube when it has six layers and
/// `cube` is set.
pub fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    pixels: &Pixels,
    cube: bool,
) -> (wgpu::Texture, wgpu::TextureView) {
    let layers = pixels.layers.len() as u32;
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: IMAGE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (layer, data) in pixels.layers.iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer as u32,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(pixels.width * 4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: pixels.width,
                height: pixels.height,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(if cube {
            wgpu::TextureViewDimension::Cube
        } else {
            wgpu::TextureViewDimension::D2
        }),
        ..Default::default()
    });
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![128; (width * height * 4) as usize])
            .unwrap();
    }

    #[test]
    fn test_decode_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mars.png");
        write_png(&path, 4, 2);
        let pixels = decode_image(&path).unwrap();
        assert_eq!((pixels.width, pixels.height), (4, 2));
        assert_eq!(pixels.layers[0].len(), 32);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_image(&dir.path().join("absent.png"));
        assert!(matches!(result, Err(TextureLoadError::Decode { .. })));
    }

    #[test]
    fn test_cube_faces_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let paths: [PathBuf; 6] =
            std::array::from_fn(|i| dir.path().join(format!("face{i}.png")));
        for (i, path) in paths.iter().enumerate() {
            let side = if i == 4 { 8 } else { 4 };
            write_png(path, side, side);
        }
        match decode_cube(&paths) {
            Err(TextureLoadError::FaceSize { expected, width, .. }) => {
                assert_eq!((expected, width), (4, 8));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_cube_faces_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let paths: [PathBuf; 6] =
            std::array::from_fn(|i| dir.path().join(format!("face{i}.png")));
        for path in &paths {
            write_png(path, 2, 2);
        }
        let pixels = decode_cube(&paths).unwrap();
        assert_eq!(pixels.layers.len(), 6);
    }

    #[test]
    fn test_fallback_is_one_texel_per_layer() {
        let pixels = Pixels::fallback(6);
        assert_eq!((pixels.width, pixels.height), (1, 1));
        assert!(pixels.layers.iter().all(|l| l == &FALLBACK_PIXEL));
    }
}
