//! Drawing surfaces for waveform bands.
//!
//! The renderer describes each band as a closed path plus a fill style and
//! hands it to a [`Surface`]. [`RasterSurface`] rasterizes onto an RGBA pixmap
//! with tiny-skia; [`RecordingSurface`] only remembers what was drawn.

use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// One drawing command of a band outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    QuadTo { cx: f32, cy: f32, x: f32, y: f32 },
    LineTo(f32, f32),
    Close,
}

/// Outline of a filled band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandPath {
    commands: Vec<PathCommand>,
}

impl BandPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo(x, y));
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::QuadTo { cx, cy, x, y });
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo(x, y));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    fn to_skia(&self) -> Option<tiny_skia::Path> {
        let mut builder = PathBuilder::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(x, y) => builder.move_to(x, y),
                PathCommand::QuadTo { cx, cy, x, y } => builder.quad_to(cx, cy, x, y),
                PathCommand::LineTo(x, y) => builder.line_to(x, y),
                PathCommand::Close => builder.close(),
            }
        }
        builder.finish()
    }
}

/// Fill style of a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStyle {
    pub color: (u8, u8, u8),
    /// Fill opacity in `[0, 1]`
    pub alpha: f32,
    /// Glow radius in pixels
    pub blur: f32,
}

/// Something the renderer can paint bands onto.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Clears the whole surface to transparent.
    fn clear(&mut self);
    fn fill_band(&mut self, path: &BandPath, style: &BandStyle);
}

/// Passes of the glow halo drawn under a band.
const GLOW_PASSES: u32 = 3;

/// Opacity of the innermost glow pass relative to the fill.
const GLOW_STRENGTH: f32 = 0.35;

/// RGBA raster surface.
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    /// Creates a transparent surface; zero dimensions are raised to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: blank_pixmap(width, height),
        }
    }

    /// Resizes the surface, discarding its contents if the size changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.pixmap.width() != width.max(1) || self.pixmap.height() != height.max(1) {
            self.pixmap = blank_pixmap(width, height);
        }
    }

    /// Pixel colour composited over black.
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        // Premultiplied RGB is exactly the colour over a black background.
        self.pixmap
            .pixel(x, y)
            .map(|p| (p.red(), p.green(), p.blue()))
            .unwrap_or((0, 0, 0))
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap.pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }
}

fn blank_pixmap(width: u32, height: u32) -> Pixmap {
    match Pixmap::new(width.max(1), height.max(1)) {
        Some(pixmap) => pixmap,
        None => {
            tracing::warn!("Raster surface {}x{} rejected, using 1x1", width, height);
            // 1x1 is always a valid pixmap size.
            Pixmap::new(1, 1).unwrap_or_else(|| unreachable!("1x1 pixmap"))
        }
    }
}

fn rgba(color: (u8, u8, u8), alpha: f32) -> Color {
    let (r, g, b) = color;
    Color::from_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn fill_band(&mut self, path: &BandPath, style: &BandStyle) {
        let Some(path) = path.to_skia() else {
            return;
        };

        let mut paint = Paint::default();
        paint.anti_alias = true;

        // Halo: progressively wider, fainter strokes under the fill.
        if style.blur > 0.5 {
            for pass in (1..=GLOW_PASSES).rev() {
                let spread = style.blur * pass as f32 / GLOW_PASSES as f32;
                let alpha = style.alpha * GLOW_STRENGTH / pass as f32;
                paint.set_color(rgba(style.color, alpha));
                let stroke = Stroke {
                    width: spread * 2.0,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        paint.set_color(rgba(style.color, style.alpha));
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// A drawing operation captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Fill { path: BandPath, style: BandStyle },
}

/// Surface that records operations instead of drawing them.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Fill styles drawn since the last clear.
    pub fn visible_fills(&self) -> Vec<&BandStyle> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Fill { style, .. } => Some(style),
                SurfaceOp::Clear => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn fill_band(&mut self, path: &BandPath, style: &BandStyle) {
        self.ops.push(SurfaceOp::Fill {
            path: path.clone(),
            style: *style,
        });
    }
}
