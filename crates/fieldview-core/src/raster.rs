//! Native executor for [`Frame`]s on a `tiny_skia::Pixmap`.
//!
//! Fills use the even-odd rule. Clip regions are `tiny_skia::Mask`s; a nested
//! push intersects with the enclosing region.

use tiny_skia::{FillRule, Mask, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::color::Color;
use crate::compositor::{DrawCommand, Frame};
use crate::error::{OverlayError, Result};
use crate::geo::PixelPoint;

/// A clip region and the global alpha to restore when it is popped.
struct ClipState {
    mask: Mask,
    saved_alpha: f64,
}

pub struct Raster {
    pixmap: Pixmap,
    clips: Vec<ClipState>,
    global_alpha: f64,
    anti_alias: bool,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            OverlayError::Surface(format!("cannot allocate a {width}x{height} surface"))
        })?;
        Ok(Self { pixmap, clips: Vec::new(), global_alpha: 1.0, anti_alias: true })
    }

    /// Anti-aliased edges are on by default.
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Resize to the frame, reset drawing state, then execute every command.
    pub fn render(&mut self, frame: &Frame) -> Result<()> {
        if (self.width(), self.height()) != (frame.width, frame.height) {
            *self = Self::new(frame.width, frame.height)?.with_anti_alias(self.anti_alias);
        }
        self.clips.clear();
        self.global_alpha = 1.0;
        for cmd in &frame.commands {
            self.execute(cmd)?;
        }
        self.clips.clear();
        Ok(())
    }

    pub fn execute(&mut self, cmd: &DrawCommand) -> Result<()> {
        match cmd {
            DrawCommand::Clear => self.pixmap.fill(tiny_skia::Color::TRANSPARENT),
            DrawCommand::StrokePath { path, color, width } => {
                if let Some(path) = ring(path) {
                    let paint = self.paint(*color);
                    let stroke = Stroke { width: *width as f32, ..Stroke::default() };
                    let clip = self.clips.last().map(|c| &c.mask);
                    self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
                }
            }
            DrawCommand::PushClip { path } => {
                let empty = Mask::new(self.width(), self.height())
                    .ok_or_else(|| OverlayError::Surface("cannot allocate clip".into()))?;
                // A degenerate outline clips everything away.
                let mask = match (ring(path), self.clips.last()) {
                    (None, _) => empty,
                    (Some(p), Some(outer)) => {
                        let mut mask = outer.mask.clone();
                        mask.intersect_path(
                            &p,
                            FillRule::EvenOdd,
                            self.anti_alias,
                            Transform::identity(),
                        );
                        mask
                    }
                    (Some(p), None) => {
                        let mut mask = empty;
                        let aa = self.anti_alias;
                        mask.fill_path(&p, FillRule::EvenOdd, aa, Transform::identity());
                        mask
                    }
                };
                self.clips.push(ClipState { mask, saved_alpha: self.global_alpha });
            }
            DrawCommand::SetGlobalAlpha { alpha } => self.global_alpha = alpha.clamp(0.0, 1.0),
            DrawCommand::FillPath { path, color } => {
                if let Some(path) = ring(path) {
                    self.fill(&path, *color, FillRule::EvenOdd);
                }
            }
            DrawCommand::PopClip => {
                if let Some(state) = self.clips.pop() {
                    self.global_alpha = state.saved_alpha;
                }
            }
            DrawCommand::FillCircle { center, radius, color } => {
                let circle =
                    PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32);
                if let Some(path) = circle {
                    self.fill(&path, *color, FillRule::Winding);
                }
            }
        }
        Ok(())
    }

    /// Straight-alpha RGBA8 value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight-alpha RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Opaque RGB8 bytes with the surface composited over `background`.
    pub fn flatten_over(&self, background: [u8; 3]) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let inv = 255 - p.alpha() as u32;
                let over = |src: u8, bg: u8| (src as u32 + (bg as u32 * inv + 127) / 255) as u8;
                [
                    over(p.red(), background[0]),
                    over(p.green(), background[1]),
                    over(p.blue(), background[2]),
                ]
            })
            .collect()
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let [r, g, b] = color.rgb;
        let alpha = color.scaled_alpha(self.global_alpha).alpha;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, (alpha * 255.0).round() as u8);
        paint.anti_alias = self.anti_alias;
        paint
    }

    fn fill(&mut self, path: &Path, color: Color, rule: FillRule) {
        let paint = self.paint(color);
        let clip = self.clips.last().map(|c| &c.mask);
        self.pixmap.fill_path(path, &paint, rule, Transform::identity(), clip);
    }
}

/// Closed path through `points`; `None` for fewer than two points or a
/// degenerate outline.
fn ring(points: &[PixelPoint]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}
