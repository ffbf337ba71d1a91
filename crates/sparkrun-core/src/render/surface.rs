use glam::Vec2;

use super::color::Rgba;

/// Axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Grow the rectangle by `by` on every side.
    pub fn inflate(self, by: f32) -> Self {
        Self::new(self.x - by, self.y - by, self.w + by * 2.0, self.h + by * 2.0)
    }
}

/// Minimal immediate-mode 2D drawing context, modeled on a canvas context.
///
/// State set through `set_*` (alpha, shadow) is scoped by `save`/`restore`.
pub trait DrawSurface {
    fn save(&mut self);
    fn restore(&mut self);
    /// Multiplier applied to the alpha of everything drawn afterwards.
    fn set_global_alpha(&mut self, alpha: f32);
    /// Blurred shadow drawn behind subsequent shapes. A blur of 0 disables it.
    fn set_shadow(&mut self, color: Rgba, blur: f32);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, line_width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32);
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);
    fn fill_text(&mut self, text: &str, at: Vec2, size: f32, color: Rgba);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    GlobalAlpha(f32),
    Shadow { color: Rgba, blur: f32 },
    FillRect { rect: Rect, color: Rgba },
    StrokeRect { rect: Rect, color: Rgba, line_width: f32 },
    FillCircle { center: Vec2, radius: f32, color: Rgba },
    StrokeCircle { center: Vec2, radius: f32, color: Rgba, line_width: f32 },
    FillPolygon { points: Vec<Vec2>, color: Rgba },
    FillText { text: String, at: Vec2, size: f32, color: Rgba },
}

/// A [`DrawSurface`] that records every call. Used headless and in tests.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of commands that actually put pixels on screen.
    pub fn paint_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                !matches!(
                    c,
                    DrawCommand::Save
                        | DrawCommand::Restore
                        | DrawCommand::GlobalAlpha(_)
                        | DrawCommand::Shadow { .. }
                )
            })
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawSurface for CommandRecorder {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn set_shadow(&mut self, color: Rgba, blur: f32) {
        self.commands.push(DrawCommand::Shadow { color, blur });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            line_width,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, size: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            size,
            color,
        });
    }
}
