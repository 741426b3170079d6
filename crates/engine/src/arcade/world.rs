use crate::math::{Rect, Vec2};

use super::body::{ArcadeBody, Blocked};

const TILE_EDGE_EPSILON: f32 = 0.001;

/// Solid-cell lookup used for body vs tile resolution.
pub trait TileGrid {
    fn tile_size(&self) -> Vec2;
    fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    gravity: Vec2,
    bounds: Rect,
    debug_draw: bool,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2, bounds: Rect) -> Self {
        Self {
            gravity,
            bounds,
            debug_draw: false,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity_y(&mut self, gravity_y: f32) {
        self.gravity.y = gravity_y;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn debug_draw(&self) -> bool {
        self.debug_draw
    }

    pub fn set_debug_draw(&mut self, enabled: bool) {
        self.debug_draw = enabled;
    }

    pub fn toggle_debug_draw(&mut self) -> bool {
        self.debug_draw = !self.debug_draw;
        self.debug_draw
    }

    /// Integrates one fixed step for a dynamic body: velocity first, then
    /// position per axis with tile and world-bound resolution. Static bodies
    /// are left untouched.
    pub fn step_body(
        &self,
        position: &mut Vec2,
        body: &mut ArcadeBody,
        dt: f32,
        tiles: Option<&dyn TileGrid>,
    ) {
        if body.is_static() || dt <= 0.0 {
            return;
        }

        body.blocked = Blocked::default();
        let gravity = if body.allow_gravity {
            self.gravity
        } else {
            Vec2::ZERO
        };
        body.velocity.x = integrate_axis(
            body.velocity.x,
            body.acceleration.x,
            body.drag.x,
            gravity.x,
            dt,
        )
        .clamp(-body.max_velocity.x, body.max_velocity.x);
        body.velocity.y = integrate_axis(
            body.velocity.y,
            body.acceleration.y,
            body.drag.y,
            gravity.y,
            dt,
        )
        .clamp(-body.max_velocity.y, body.max_velocity.y);

        let delta = body.velocity * dt;
        let max_substep = tiles
            .map(|grid| {
                let size = grid.tile_size();
                (size.x.min(size.y) * 0.5).max(1.0)
            })
            .unwrap_or(f32::INFINITY);
        let substeps = (delta.x.abs().max(delta.y.abs()) / max_substep)
            .ceil()
            .clamp(1.0, 64.0) as u32;
        let step = delta * (1.0 / substeps as f32);

        let mut move_x = step.x != 0.0;
        let mut move_y = step.y != 0.0;
        for _ in 0..substeps {
            if move_x {
                position.x += step.x;
                if let Some(grid) = tiles {
                    if resolve_tiles_x(position, body, grid, step.x) {
                        move_x = false;
                    }
                }
            }
            if move_y {
                position.y += step.y;
                if let Some(grid) = tiles {
                    if resolve_tiles_y(position, body, grid, step.y) {
                        move_y = false;
                    }
                }
            }
            if !move_x && !move_y {
                break;
            }
        }

        if body.collide_world_bounds {
            self.clamp_to_bounds(position, body);
        }
    }

    fn clamp_to_bounds(&self, position: &mut Vec2, body: &mut ArcadeBody) {
        let bounds = self.bounds;
        if bounds.w <= 0.0 || bounds.h <= 0.0 {
            return;
        }
        let half = body.size * 0.5;
        if position.x - half.x < bounds.left() {
            position.x = bounds.left() + half.x;
            body.velocity.x = body.velocity.x.max(0.0);
            body.blocked.left = true;
        } else if position.x + half.x > bounds.right() {
            position.x = bounds.right() - half.x;
            body.velocity.x = body.velocity.x.min(0.0);
            body.blocked.right = true;
        }
        if position.y - half.y < bounds.top() {
            position.y = bounds.top() + half.y;
            body.velocity.y = body.velocity.y.max(0.0);
            body.blocked.up = true;
        } else if position.y + half.y > bounds.bottom() {
            position.y = bounds.bottom() - half.y;
            body.velocity.y = body.velocity.y.min(0.0);
            body.blocked.down = true;
        }
    }
}

/// Acceleration wins over drag; drag only slows a body that is not being pushed.
fn integrate_axis(velocity: f32, acceleration: f32, drag: f32, gravity: f32, dt: f32) -> f32 {
    let mut next = velocity;
    if acceleration != 0.0 {
        next += acceleration * dt;
    } else if drag > 0.0 {
        let reduction = drag * dt;
        next = if next.abs() <= reduction {
            0.0
        } else {
            next - reduction * next.signum()
        };
    }
    next + gravity * dt
}

#[derive(Debug, Clone, Copy)]
struct TileSpan {
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
}

fn tile_span(rect: Rect, tile_size: Vec2) -> TileSpan {
    TileSpan {
        x_min: (rect.left() / tile_size.x).floor() as i32,
        x_max: ((rect.right() - TILE_EDGE_EPSILON) / tile_size.x).floor() as i32,
        y_min: (rect.top() / tile_size.y).floor() as i32,
        y_max: ((rect.bottom() - TILE_EDGE_EPSILON) / tile_size.y).floor() as i32,
    }
}

fn resolve_tiles_x(
    position: &mut Vec2,
    body: &mut ArcadeBody,
    grid: &dyn TileGrid,
    direction: f32,
) -> bool {
    let tile_size = grid.tile_size();
    let span = tile_span(body.bounds_at(*position), tile_size);
    let column_is_solid = |tx: i32| (span.y_min..=span.y_max).any(|ty| grid.is_solid(tx, ty));

    if direction > 0.0 {
        if let Some(tx) = (span.x_min..=span.x_max).find(|tx| column_is_solid(*tx)) {
            position.x = tx as f32 * tile_size.x - body.size.x * 0.5;
            body.velocity.x = 0.0;
            body.blocked.right = true;
            return true;
        }
    } else if let Some(tx) = (span.x_min..=span.x_max).rev().find(|tx| column_is_solid(*tx)) {
        position.x = (tx + 1) as f32 * tile_size.x + body.size.x * 0.5;
        body.velocity.x = 0.0;
        body.blocked.left = true;
        return true;
    }
    false
}

fn resolve_tiles_y(
    position: &mut Vec2,
    body: &mut ArcadeBody,
    grid: &dyn TileGrid,
    direction: f32,
) -> bool {
    let tile_size = grid.tile_size();
    let span = tile_span(body.bounds_at(*position), tile_size);
    let row_is_solid = |ty: i32| (span.x_min..=span.x_max).any(|tx| grid.is_solid(tx, ty));

    if direction > 0.0 {
        if let Some(ty) = (span.y_min..=span.y_max).find(|ty| row_is_solid(*ty)) {
            position.y = ty as f32 * tile_size.y - body.size.y * 0.5;
            body.velocity.y = 0.0;
            body.blocked.down = true;
            return true;
        }
    } else if let Some(ty) = (span.y_min..=span.y_max).rev().find(|ty| row_is_solid(*ty)) {
        position.y = (ty + 1) as f32 * tile_size.y + body.size.y * 0.5;
        body.velocity.y = 0.0;
        body.blocked.up = true;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    struct TestGrid {
        width: i32,
        height: i32,
        solid: Vec<bool>,
    }

    impl TestGrid {
        fn empty(width: i32, height: i32) -> Self {
            Self {
                width,
                height,
                solid: vec![false; (width * height) as usize],
            }
        }

        fn with_row(mut self, row: i32) -> Self {
            for x in 0..self.width {
                self.solid[(row * self.width + x) as usize] = true;
            }
            self
        }

        fn with_column(mut self, column: i32) -> Self {
            for y in 0..self.height {
                self.solid[(y * self.width + column) as usize] = true;
            }
            self
        }
    }

    impl TileGrid for TestGrid {
        fn tile_size(&self) -> Vec2 {
            Vec2::new(18.0, 18.0)
        }

        fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool {
            if tile_x < 0 || tile_y < 0 || tile_x >= self.width || tile_y >= self.height {
                return false;
            }
            self.solid[(tile_y * self.width + tile_x) as usize]
        }
    }

    fn world_with_gravity(gravity_y: f32) -> PhysicsWorld {
        PhysicsWorld::new(
            Vec2::new(0.0, gravity_y),
            Rect::new(0.0, 0.0, 18.0 * 10.0, 18.0 * 8.0),
        )
    }

    #[test]
    fn falling_body_lands_on_solid_row() {
        let world = world_with_gravity(1500.0);
        let grid = TestGrid::empty(10, 8).with_row(5);
        let mut position = Vec2::new(27.0, 12.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(24.0, 24.0));

        for _ in 0..120 {
            world.step_body(&mut position, &mut body, DT, Some(&grid));
        }

        assert!(body.blocked.down);
        assert_eq!(body.velocity.y, 0.0);
        assert!((position.y - 78.0).abs() < 0.001, "y={}", position.y);
    }

    #[test]
    fn grounded_flag_persists_while_resting() {
        let world = world_with_gravity(1500.0);
        let grid = TestGrid::empty(10, 8).with_row(5);
        let mut position = Vec2::new(27.0, 78.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(24.0, 24.0));

        for _ in 0..10 {
            world.step_body(&mut position, &mut body, DT, Some(&grid));
            assert!(body.on_floor());
        }
    }

    #[test]
    fn drag_brings_unpushed_body_to_rest() {
        let world = world_with_gravity(0.0);
        let mut position = Vec2::new(50.0, 50.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(10.0, 10.0));
        body.velocity.x = 100.0;
        body.drag.x = 500.0;

        world.step_body(&mut position, &mut body, DT, None);
        assert!((body.velocity.x - (100.0 - 500.0 * DT)).abs() < 0.001);

        for _ in 0..60 {
            world.step_body(&mut position, &mut body, DT, None);
        }
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn acceleration_overrides_drag() {
        let world = world_with_gravity(0.0);
        let mut position = Vec2::new(50.0, 50.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(10.0, 10.0));
        body.acceleration.x = -400.0;
        body.drag.x = 500.0;

        world.step_body(&mut position, &mut body, DT, None);
        assert!((body.velocity.x + 400.0 * DT).abs() < 0.001);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let world = world_with_gravity(0.0);
        let grid = TestGrid::empty(10, 8).with_column(3);
        let mut position = Vec2::new(20.0, 40.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(10.0, 10.0));
        body.velocity.x = 600.0;

        for _ in 0..30 {
            world.step_body(&mut position, &mut body, DT, Some(&grid));
        }

        assert!((position.x - 49.0).abs() < 0.001, "x={}", position.x);
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.blocked.right);
    }

    #[test]
    fn fast_upward_motion_does_not_tunnel_through_thin_ceiling() {
        let world = world_with_gravity(0.0);
        let grid = TestGrid::empty(10, 8).with_row(2);
        let mut position = Vec2::new(40.0, 120.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(24.0, 24.0));
        body.velocity.y = -2000.0;

        for _ in 0..10 {
            world.step_body(&mut position, &mut body, DT, Some(&grid));
        }

        assert!((position.y - 66.0).abs() < 0.001, "y={}", position.y);
        assert!(body.blocked.up);
    }

    #[test]
    fn world_bounds_block_the_floor() {
        let world = world_with_gravity(1500.0);
        let mut position = Vec2::new(40.0, 100.0);
        let mut body = ArcadeBody::dynamic(Vec2::new(24.0, 24.0));
        body.collide_world_bounds = true;

        for _ in 0..120 {
            world.step_body(&mut position, &mut body, DT, None);
        }

        assert!(body.blocked.down);
        assert!((position.y - (144.0 - 12.0)).abs() < 0.001);
    }

    #[test]
    fn static_bodies_never_move() {
        let world = world_with_gravity(1500.0);
        let mut position = Vec2::new(40.0, 40.0);
        let mut body = ArcadeBody::fixed(Vec2::new(18.0, 18.0));
        body.velocity.y = 100.0;

        world.step_body(&mut position, &mut body, DT, None);
        assert_eq!(position, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn debug_draw_toggles() {
        let mut world = PhysicsWorld::default();
        assert!(world.toggle_debug_draw());
        assert!(!world.toggle_debug_draw());
    }
}
