/// Anchor point of a text block in overlay pixel space. `x` is the horizontal centre of the
/// block (`text-anchor="middle"`) and `y` its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
