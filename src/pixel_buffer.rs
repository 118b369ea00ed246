use serde::{Deserialize, Serialize};

use crate::error::PixelError;

/// A 32-bit colour packed as `0xAARRGGBB`.
pub type Argb = u32;

pub const TRANSPARENT: Argb = 0x0000_0000;

/// Bytes used per pixel in the flat encoding
pub const BYTES_PER_PIXEL: usize = 4;

/// Integer pixel coordinate on a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Split a packed colour into `[a, r, g, b]`.
pub fn argb_channels(color: Argb) -> [u8; 4] {
    color.to_be_bytes()
}

pub fn argb_from_channels(a: u8, r: u8, g: u8, b: u8) -> Argb {
    Argb::from_be_bytes([a, r, g, b])
}

/// Fixed-size grid of ARGB pixels backing one layer.
///
/// Dimensions never change after creation. Access outside the grid is an
/// error rather than a wrap-around.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Argb>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &format!("<{} pixels>", self.pixels.len()))
            .finish()
    }
}

impl PixelBuffer {
    /// Create a fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Argb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Argb] {
        &self.pixels
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Clamp a coordinate into the buffer. An empty buffer clamps to the origin.
    pub fn clamp(&self, pos: PixelPos) -> PixelPos {
        PixelPos {
            x: pos.x.clamp(0, (self.width as i32 - 1).max(0)),
            y: pos.y.clamp(0, (self.height as i32 - 1).max(0)),
        }
    }

    fn index(&self, x: i32, y: i32) -> Result<usize, PixelError> {
        if !self.contains(x, y) {
            return Err(PixelError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Argb, PixelError> {
        let index = self.index(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set(&mut self, x: i32, y: i32, color: Argb) -> Result<(), PixelError> {
        let index = self.index(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    /// Overwrite every pixel with `color`
    pub fn clear(&mut self, color: Argb) {
        self.pixels.fill(color);
    }

    /// Replace this buffer's contents with `source`.
    ///
    /// Both buffers must have the same dimensions.
    pub fn copy_from(&mut self, source: &PixelBuffer) -> Result<(), PixelError> {
        if self.width != source.width || self.height != source.height {
            return Err(PixelError::BufferSizeMismatch {
                expected: self.byte_len(),
                actual: source.byte_len(),
            });
        }
        self.pixels.copy_from_slice(&source.pixels);
        Ok(())
    }

    /// Size of the flat encoding in bytes
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * BYTES_PER_PIXEL
    }

    /// Row-major encoding, four bytes per pixel in A, R, G, B order.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for pixel in &self.pixels {
            bytes.extend_from_slice(&argb_channels(*pixel));
        }
        bytes
    }

    /// Inverse of [`PixelBuffer::encode`].
    pub fn decode(bytes: &[u8], width: u32, height: u32) -> Result<Self, PixelError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if bytes.len() != expected {
            return Err(PixelError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|chunk| argb_from_channels(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_transparent() {
        let buffer = PixelBuffer::new(4, 3);
        assert_eq!(buffer.pixels().len(), 12);
        assert!(buffer.pixels().iter().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut buffer = PixelBuffer::new(2, 2);
        assert!(buffer.get(2, 0).is_err());
        assert!(buffer.get(0, -1).is_err());
        assert_eq!(
            buffer.set(-1, 0, 0xFFFF_FFFF),
            Err(PixelError::OutOfBounds { x: -1, y: 0, width: 2, height: 2 })
        );
    }

    #[test]
    fn copies_are_independent() {
        let mut buffer = PixelBuffer::new(2, 2);
        let snapshot = buffer.clone();
        buffer.set(1, 1, 0xFF00_FF00).unwrap();

        assert_eq!(snapshot.get(1, 1).unwrap(), TRANSPARENT);
        assert_eq!(buffer.get(1, 1).unwrap(), 0xFF00_FF00);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut buffer = PixelBuffer::new(3, 2);
        buffer.set(0, 0, 0x80FF_0000).unwrap();
        buffer.set(2, 1, 0x1234_5678).unwrap();

        let bytes = buffer.encode();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert_eq!(&bytes[..4], &[0x80, 0xFF, 0x00, 0x00]);

        let decoded = PixelBuffer::decode(&bytes, 3, 2).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = PixelBuffer::decode(&[0; 7], 1, 2).unwrap_err();
        assert_eq!(err, PixelError::BufferSizeMismatch { expected: 8, actual: 7 });
    }

    #[test]
    fn clamp_keeps_coordinates_inside() {
        let buffer = PixelBuffer::new(10, 5);
        assert_eq!(buffer.clamp(PixelPos::new(-3, 9)), PixelPos::new(0, 4));
    }

    #[test]
    fn clamp_on_empty_buffer_is_the_origin() {
        let buffer = PixelBuffer::new(0, 0);
        assert_eq!(buffer.clamp(PixelPos::new(7, -2)), PixelPos::new(0, 0));
        assert!(buffer.get(0, 0).is_err());
    }
}
