use std::path::Path;

use crate::error::{GanError, Result};
use crate::math::matrix::Matrix;

/// Images decoded from an IDX3 file, one flattened image per row.
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub width: usize,
    pub height: usize,
    /// Pixels scaled from `[0, 255]` to `[-1, 1]`, the range of a tanh generator.
    pub pixels: Matrix,
}

pub fn load_images(path: impl AsRef<Path>) -> Result<ImageSet> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_images(&bytes)
}

/// Parses an IDX3 image file as used by MNIST and its derivatives.
///
/// # Layout
/// ```text
/// bytes  0-1:   0x00 0x00   (reserved, must be zero)
/// byte   2:     0x08        (dtype = uint8)
/// byte   3:     0x03        (number of dimensions = 3)
/// bytes  4-7:   N           (number of images, big-endian u32)
/// bytes  8-11:  rows        (image height in pixels, big-endian u32)
/// bytes 12-15:  cols        (image width in pixels, big-endian u32)
/// bytes 16..:   N * rows * cols bytes, row-major, uint8
/// ```
pub fn parse_images(bytes: &[u8]) -> Result<ImageSet> {
    if bytes.len() < 16 {
        return Err(GanError::Data(format!(
            "IDX image file too short: expected at least 16 header bytes, got {}.",
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(GanError::Data(format!(
            "IDX image file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(GanError::Data(format!(
            "IDX image file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            bytes[2]
        )));
    }
    if bytes[3] != 0x03 {
        return Err(GanError::Data(format!(
            "IDX image file: byte 3 (dimensions) must be 3, got {}.",
            bytes[3]
        )));
    }

    let be_u32 = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize;
    let n_items = be_u32(4);
    let height = be_u32(8);
    let width = be_u32(12);

    let n_pixels = height.checked_mul(width)
        .ok_or_else(|| GanError::Data(format!("IDX image file: {}×{} overflows usize.", height, width)))?;
    let required = n_items.checked_mul(n_pixels)
        .and_then(|n| n.checked_add(16))
        .ok_or_else(|| GanError::Data("IDX image file: data length overflows usize.".to_owned()))?;
    if bytes.len() < required {
        return Err(GanError::Data(format!(
            "IDX image file too short: header declares {} images of {}×{} pixels, \
             but file is only {} bytes.",
            n_items, height, width, bytes.len()
        )));
    }
    if n_items == 0 || n_pixels == 0 {
        return Err(GanError::Data("IDX image file holds no pixels.".to_owned()));
    }

    let data = bytes[16..required]
        .chunks_exact(n_pixels)
        .map(|chunk| chunk.iter().map(|&px| px as f64 / 127.5 - 1.0).collect())
        .collect();

    Ok(ImageSet { width, height, pixels: Matrix::from_data(data) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx3(images: &[[u8; 4]]) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x08, 0x03];
        bytes.extend_from_slice(&(images.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        for img in images {
            bytes.extend_from_slice(img);
        }
        bytes
    }

    #[test]
    fn pixels_are_scaled_to_tanh_range() {
        let set = parse_images(&idx3(&[[0, 255, 0, 255], [255, 255, 0, 0]])).unwrap();
        assert_eq!((set.width, set.height), (2, 2));
        assert_eq!(set.pixels.shape(), (2, 4));
        assert_eq!(set.pixels.data[0], vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn truncated_file_is_a_data_error() {
        let mut bytes = idx3(&[[1, 2, 3, 4]]);
        bytes.pop();
        assert!(matches!(parse_images(&bytes), Err(GanError::Data(_))));
    }

    #[test]
    fn label_file_is_rejected() {
        let bytes = [0x00, 0x00, 0x08, 0x01, 0, 0, 0, 1, 7];
        assert!(matches!(parse_images(&bytes), Err(GanError::Data(_))));
    }

    #[test]
    fn load_images_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.idx3");
        std::fs::write(&path, idx3(&[[0, 0, 0, 0]])).unwrap();
        assert_eq!(load_images(&path).unwrap().pixels.rows, 1);
    }
}
