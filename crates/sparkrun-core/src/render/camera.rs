use glam::Vec2;

/// Visible region of the world, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl ViewBounds {
    /// Whether the world-space box `(x, y, w, h)` overlaps these bounds
    /// grown by `margin` on every side.
    pub fn overlaps(&self, x: f32, y: f32, w: f32, h: f32, margin: f32) -> bool {
        x + w >= self.start_x - margin
            && x <= self.end_x + margin
            && y + h >= self.start_y - margin
            && y <= self.end_y + margin
    }
}

/// World-to-screen mapping used by every renderer.
pub trait Camera {
    fn transform_coordinates(&self, world: Vec2) -> Vec2;
    /// Convert a horizontal world length to screen pixels.
    fn transform_x(&self, len: f32) -> f32;
    /// Convert a vertical world length to screen pixels.
    fn transform_y(&self, len: f32) -> f32;
    fn visible_bounds(&self) -> ViewBounds;
}

/// Orthographic camera: a world-space origin, a zoom (pixels per world
/// unit), and a viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCamera {
    pub origin: Vec2,
    pub zoom: f32,
    pub viewport: Vec2,
}

impl FixedCamera {
    pub fn new(origin: Vec2, zoom: f32, viewport: Vec2) -> Self {
        Self {
            origin,
            zoom: zoom.max(f32::EPSILON),
            viewport,
        }
    }

    /// Center the view on `target`.
    pub fn look_at(&mut self, target: Vec2) {
        self.origin = target - self.viewport / (2.0 * self.zoom);
    }
}

impl Camera for FixedCamera {
    fn transform_coordinates(&self, world: Vec2) -> Vec2 {
        (world - self.origin) * self.zoom
    }

    fn transform_x(&self, len: f32) -> f32 {
        len * self.zoom
    }

    fn transform_y(&self, len: f32) -> f32 {
        len * self.zoom
    }

    fn visible_bounds(&self) -> ViewBounds {
        let extent = self.viewport / self.zoom;
        ViewBounds {
            start_x: self.origin.x,
            start_y: self.origin.y,
            end_x: self.origin.x + extent.x,
            end_y: self.origin.y + extent.y,
        }
    }
}
