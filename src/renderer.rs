use std::io::Cursor;

use egui::{Color32, ColorImage};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::config::CanvasConfig;
use crate::error::ExportError;
use crate::layer::Layer;
use crate::pixel_buffer::argb_channels;

/// Unmultiplied RGBA pixels produced by flattening a layer stack
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub width: usize,
    pub height: usize,
    /// Row-major, four bytes per pixel
    pub rgba: Vec<u8>,
}

impl Flattened {
    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied([self.width, self.height], &self.rgba)
    }

    /// Encode as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>, ExportError> {
        let empty = ExportError::EmptyImage {
            width: self.width,
            height: self.height,
        };
        if self.width == 0 || self.height == 0 {
            return Err(empty);
        }
        let image = RgbaImage::from_raw(self.width as u32, self.height as u32, self.rgba.clone()).ok_or(empty)?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Flattens layers for the rendering surface and for previews.
///
/// When a layer is active it draws at full opacity and the others at the
/// configured inactive alpha. With no active layer everything is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    inactive_alpha: u8,
}

impl Compositor {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            inactive_alpha: config.inactive_layer_alpha,
        }
    }

    /// Opacity multiplier (0-255) for `layer`
    pub fn layer_alpha(&self, layer: &Layer, any_active: bool) -> u8 {
        if !any_active || layer.is_active() {
            255
        } else {
            self.inactive_alpha
        }
    }

    /// Draw every layer stretched over a `view_size` view, shifted by its
    /// offset in view pixels. Scaling is nearest neighbour.
    pub fn composite(&self, layers: &[Layer], view_size: [usize; 2]) -> ColorImage {
        self.flatten_view(layers, view_size).to_color_image()
    }

    pub fn flatten_view(&self, layers: &[Layer], view_size: [usize; 2]) -> Flattened {
        let [view_w, view_h] = view_size;
        let any_active = layers.iter().any(Layer::is_active);
        let mut accum = vec![[0.0f32; 4]; view_w * view_h];

        for layer in layers {
            let alpha = self.layer_alpha(layer, any_active);
            let buffer = layer.buffer();
            let (buf_w, buf_h) = (buffer.width() as i64, buffer.height() as i64);
            let (offset_x, offset_y) = (layer.offset.0 as i64, layer.offset.1 as i64);

            for vy in 0..view_h {
                let sy = ((vy as i64 - offset_y) * buf_h).div_euclid(view_h as i64);
                if !(0..buf_h).contains(&sy) {
                    continue;
                }
                for vx in 0..view_w {
                    let sx = ((vx as i64 - offset_x) * buf_w).div_euclid(view_w as i64);
                    if !(0..buf_w).contains(&sx) {
                        continue;
                    }
                    if let Ok(pixel) = buffer.get(sx as i32, sy as i32) {
                        blend_over(&mut accum[vy * view_w + vx], argb_channels(pixel), alpha);
                    }
                }
            }
        }

        to_flattened(view_w, view_h, &accum)
    }

    /// Flatten at buffer resolution, ignoring offsets and the active layer.
    pub fn preview(&self, layers: &[Layer]) -> Flattened {
        let Some(first) = layers.first() else {
            return Flattened {
                width: 0,
                height: 0,
                rgba: Vec::new(),
            };
        };
        let (width, height) = (first.buffer().width() as usize, first.buffer().height() as usize);
        let mut accum = vec![[0.0f32; 4]; width * height];

        for layer in layers {
            for (i, pixel) in layer.buffer().pixels().iter().enumerate().take(accum.len()) {
                blend_over(&mut accum[i], argb_channels(*pixel), 255);
            }
        }
        to_flattened(width, height, &accum)
    }

    /// PNG preview of the whole stack
    pub fn export_png(&self, layers: &[Layer]) -> Result<Vec<u8>, ExportError> {
        let png = self.preview(layers).to_png()?;
        log::debug!("exported {} layers to {} png bytes", layers.len(), png.len());
        Ok(png)
    }
}

/// Source-over blend of an `[a, r, g, b]` pixel, scaled by `alpha`, onto an
/// unmultiplied `[r, g, b, a]` accumulator in 0..=1.
fn blend_over(dst: &mut [f32; 4], src: [u8; 4], alpha: u8) {
    let src_a = (src[0] as f32 / 255.0) * (alpha as f32 / 255.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3];
    let out_a = src_a + dst_a * (1.0 - src_a);
    for c in 0..3 {
        let s = src[c + 1] as f32 / 255.0;
        dst[c] = (s * src_a + dst[c] * dst_a * (1.0 - src_a)) / out_a;
    }
    dst[3] = out_a;
}

fn to_flattened(width: usize, height: usize, accum: &[[f32; 4]]) -> Flattened {
    let rgba = accum
        .iter()
        .flat_map(|px| px.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
        .collect();
    Flattened { width, height, rgba }
}

/// Convert a packed ARGB colour for egui
pub fn to_color32(color: u32) -> Color32 {
    let [a, r, g, b] = argb_channels(color);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::pixel_buffer::PixelPos;

    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;

    fn two_layer_canvas() -> Canvas {
        let config = CanvasConfig {
            layer_width: 4,
            layer_height: 4,
            ..CanvasConfig::default()
        };
        let mut canvas = Canvas::new(&config);
        canvas.layer_mut(0).unwrap().buffer_mut().clear(RED);
        canvas.add_layer("top");
        canvas.set_color(BLUE);
        canvas.paint_at(1, PixelPos::new(0, 0), false).unwrap();
        canvas
    }

    fn pixel(image: &Flattened, x: usize, y: usize) -> [u8; 4] {
        let i = (y * image.width + x) * 4;
        [image.rgba[i], image.rgba[i + 1], image.rgba[i + 2], image.rgba[i + 3]]
    }

    #[test]
    fn inactive_layers_are_faded() {
        let mut canvas = two_layer_canvas();
        let compositor = Compositor::new(&CanvasConfig::default());

        canvas.set_active_layer(Some(1)).unwrap();
        let faded = compositor.flatten_view(canvas.layers(), [4, 4]);
        assert_eq!(pixel(&faded, 3, 3), [255, 0, 0, 55]);
        assert_eq!(pixel(&faded, 0, 0), [0, 0, 255, 255]);

        canvas.set_active_layer(None).unwrap();
        let opaque = compositor.flatten_view(canvas.layers(), [4, 4]);
        assert_eq!(pixel(&opaque, 3, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn layers_scale_to_view_and_follow_offsets() {
        let mut canvas = two_layer_canvas();
        canvas.set_active_layer(None).unwrap();
        canvas.layer_mut(1).unwrap().set_pos(2, 0);
        let compositor = Compositor::new(&CanvasConfig::default());

        let image = compositor.flatten_view(canvas.layers(), [8, 8]);
        // the top layer's 1x1 dot covers a 2x2 block, shifted right by two
        assert_eq!(pixel(&image, 2, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&image, 3, 1), [0, 0, 255, 255]);
        assert_eq!(pixel(&image, 0, 0), [255, 0, 0, 255]);

        let color_image = compositor.composite(canvas.layers(), [8, 8]);
        assert_eq!(color_image.size, [8, 8]);
        assert_eq!(color_image.pixels[2], to_color32(BLUE));
    }

    #[test]
    fn preview_exports_png() {
        let canvas = two_layer_canvas();
        let compositor = Compositor::new(&CanvasConfig::default());

        let preview = compositor.preview(canvas.layers());
        assert_eq!((preview.width, preview.height), (4, 4));
        assert_eq!(pixel(&preview, 0, 0), [0, 0, 255, 255]);

        let png = compositor.export_png(canvas.layers()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn empty_stack_cannot_be_exported() {
        let compositor = Compositor::new(&CanvasConfig::default());
        assert!(matches!(compositor.export_png(&[]), Err(ExportError::EmptyImage { .. })));
    }
}
