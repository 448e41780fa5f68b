//! Surface that records draw calls instead of rasterizing them

use glam::Vec2;

use super::Surface;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(String),
    Line { from: Vec2, to: Vec2, color: String, width: f32 },
    FillCircle { center: Vec2, radius: f32, color: String },
    StrokeCircle { center: Vec2, radius: f32, color: String, width: f32 },
}

/// Headless surface for tests and the native build
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn fills(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::FillCircle { .. }))
            .count()
    }

    pub fn lines(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Line { .. }))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    // A clear starts a new frame
    fn clear(&mut self, color: &str) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear(color.to_string()));
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: &str, width: f32) {
        self.calls.push(DrawCall::Line {
            from,
            to,
            color: color.to_string(),
            width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        self.calls.push(DrawCall::FillCircle {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: &str, width: f32) {
        self.calls.push(DrawCall::StrokeCircle {
            center,
            radius,
            color: color.to_string(),
            width,
        });
    }
}
