use glam::{UVec2, Vec2};

use crate::spark::SparkKind;

/// Heat forced into the cell under a primary-button drag.
pub const DRAG_HEAT: u8 = 255;

/// Which pointer button is held (or pressed) for an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    None,
    Primary,
    Secondary,
}

/// A grid-space action produced by pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Ignite { x: u32, y: u32, heat: u8 },
    Spawn { kind: SparkKind, x: u32, y: u32 },
    RemoveNear { x: u32, y: u32 },
}

/// Maps window-pixel pointer events onto the simulation grid.
///
/// Holds no simulation state: it only knows both sizes and the current brush.
pub struct InputMapper {
    grid: UVec2,
    window: Vec2,
    /// Spark kind spawned by primary-button actions.
    pub brush: SparkKind,
}

impl InputMapper {
    pub fn new(grid_w: u32, grid_h: u32) -> Self {
        Self {
            grid: UVec2::new(grid_w, grid_h),
            window: Vec2::ZERO,
            brush: SparkKind::Blaze,
        }
    }

    /// Client-area size, in the same pixels pointer events use.
    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window = Vec2::new(width, height);
    }

    /// `floor(grid * pos / window)` per axis, clamped onto the grid.
    /// None until a non-empty window size is known.
    pub fn to_grid(&self, pos: Vec2) -> Option<UVec2> {
        if self.window.x <= 0.0 || self.window.y <= 0.0 {
            return None;
        }
        let g = (self.grid.as_vec2() * pos / self.window).floor();
        let max = (self.grid - UVec2::ONE).as_vec2();
        Some(g.clamp(Vec2::ZERO, max).as_uvec2())
    }

    /// Pointer moved with `button` held.
    pub fn pointer_move(&self, button: PointerButton, pos: Vec2, out: &mut Vec<InputCommand>) {
        let Some(cell) = self.to_grid(pos) else {
            return;
        };
        let (x, y) = (cell.x, cell.y);
        match button {
            PointerButton::Primary => {
                out.push(InputCommand::Ignite {
                    x,
                    y,
                    heat: DRAG_HEAT,
                });
                out.push(InputCommand::Spawn {
                    kind: self.brush,
                    x,
                    y,
                });
            }
            PointerButton::Secondary => out.push(InputCommand::RemoveNear { x, y }),
            PointerButton::None => {}
        }
    }

    /// Button pressed at `pos`. Only the primary button acts on press.
    pub fn pointer_down(&self, button: PointerButton, pos: Vec2, out: &mut Vec<InputCommand>) {
        if button != PointerButton::Primary {
            return;
        }
        if let Some(cell) = self.to_grid(pos) {
            out.push(InputCommand::Spawn {
                kind: self.brush,
                x: cell.x,
                y: cell.y,
            });
        }
    }
}
