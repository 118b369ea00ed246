use crate::pixel_buffer::{Argb, PixelBuffer, PixelPos};

/// Points strictly between `from` and `to` on a straight line.
///
/// The step count follows the dominant axis, so diagonal motion gets as many
/// samples as axis-aligned motion of the same length. Neither endpoint is
/// included.
pub fn interpolate(from: PixelPos, to: PixelPos) -> Vec<PixelPos> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = dx.abs().max(dy.abs());

    (1..steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            PixelPos {
                x: (from.x as f32 + t * dx as f32).round() as i32,
                y: (from.y as f32 + t * dy as f32).round() as i32,
            }
        })
        .collect()
}

/// Pixels covered by a square stamp of `size` centred on `center`.
///
/// Even sizes extend one pixel further up and to the left. Pixels outside the
/// buffer are dropped.
pub fn stamp(buffer: &PixelBuffer, center: PixelPos, size: u32) -> Vec<PixelPos> {
    let size = size.max(1) as i32;
    let start = -(size / 2);
    let mut covered = Vec::with_capacity((size * size) as usize);
    for dy in start..start + size {
        for dx in start..start + size {
            let (x, y) = (center.x + dx, center.y + dy);
            if buffer.contains(x, y) {
                covered.push(PixelPos::new(x, y));
            }
        }
    }
    covered
}

/// Write `color` under a stamp. Returns how many pixels were written.
pub fn paint_stamp(buffer: &mut PixelBuffer, center: PixelPos, size: u32, color: Argb) -> usize {
    let covered = stamp(buffer, center, size);
    for pos in &covered {
        // stamp() only yields in-bounds positions
        let _ = buffer.set(pos.x, pos.y, color);
    }
    covered.len()
}
