//! Output readback and PNG encoding.

use std::path::Path;

use crate::error::RenderError;

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a texture-to-buffer copy for `width` RGBA8 pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_PIXEL).div_ceil(align) * align
}

/// Strip the row padding of a mapped readback buffer.
pub fn unpad_rows(mapped: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row_len = (width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * padded_row as usize;
        pixels.extend_from_slice(&mapped[start..start + row_len]);
    }
    pixels
}

pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>, png::EncodingError> {
    let mut png_buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(std::io::Cursor::new(&mut png_buf), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
    }
    Ok(png_buf)
}

/// Copy `texture` into a mappable buffer and return its tightly packed pixels.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>, RenderError> {
    let width = texture.width();
    let height = texture.height();
    let padded = padded_bytes_per_row(width);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("output-readback"),
        size: u64::from(padded * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| RenderError::Readback(e.to_string()))?;

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(RenderError::Readback(e.to_string())),
        Err(e) => return Err(RenderError::Readback(e.to_string())),
    }

    let mapped = slice.get_mapped_range();
    let pixels = unpad_rows(&mapped, width, height, padded);
    drop(mapped);
    buffer.unmap();
    Ok(pixels)
}

/// Write RGBA8 pixels to `path` as PNG.
pub fn save_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), RenderError> {
    let bytes = encode_png(width, height, rgba)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    log::info!("Saved screenshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn test_unpad_rows_drops_padding() {
        let padded = padded_bytes_per_row(2);
        let mut mapped = vec![0u8; (padded * 2) as usize];
        mapped[..8].copy_from_slice(&[1; 8]);
        mapped[padded as usize..padded as usize + 8].copy_from_slice(&[2; 8]);
        let pixels = unpad_rows(&mapped, 2, 2, padded);
        assert_eq!(pixels.len(), 16);
        assert!(pixels[..8].iter().all(|&b| b == 1));
        assert!(pixels[8..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_save_png_round_trips_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("frame.png");
        save_png(&path, 3, 2, &[200; 24]).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        assert!(encode_png(4, 4, &[0; 8]).is_err());
    }
}
