//! Spatial encoder - rasterizes the scene into small grids plus a proximity vector

use crate::infra::{Axis, ConfigurationError, Rect, SnapshotProvider};
use crate::state::{CharacterState, Platform, TerrainPiece};

/// Grid resolution fed to the predictor
pub const GRID_WIDTH: usize = 60;
pub const GRID_HEIGHT: usize = 50;
pub const GRID_CELLS: usize = GRID_WIDTH * GRID_HEIGHT;

pub const PROXIMITY_FEATURES: usize = 4;

/// Inverse gap size: a higher value means the proximity signal fades over a
/// shorter distance.
pub const GAP_SENSITIVITY: f32 = 14.0;

/// Maximum representable pixel intensity (packed 24-bit colour)
pub const MAX_INTENSITY: u32 = 0xFF_FFFF;

const FOREGROUND: u32 = 0xFF_FFFF;
const PLAYER_SHADE: u32 = 0x80_8080;

/// Single-channel raster at stage resolution.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Paint `rect` (canvas coordinates) with `value`, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: Rect, value: u32) {
        let Some((x_range, y_range)) = self.clip(rect) else {
            return;
        };
        for y in y_range {
            let row = y * self.width;
            self.pixels[row + x_range.start..row + x_range.end].fill(value);
        }
    }

    fn clip(&self, rect: Rect) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        if !rect.is_finite() {
            return None;
        }
        let x0 = rect.x0.round().clamp(0.0, self.width as f32) as usize;
        let x1 = rect.x1.round().clamp(0.0, self.width as f32) as usize;
        let y0 = rect.y0.round().clamp(0.0, self.height as f32) as usize;
        let y1 = rect.y1.round().clamp(0.0, self.height as f32) as usize;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0..x1, y0..y1))
    }

    /// Area-averaging resample to `out_width` x `out_height`, normalized to
    /// [0, 1] by `MAX_INTENSITY`. Row-major output.
    pub fn downsample(&self, out_width: usize, out_height: usize) -> Vec<f32> {
        let mut grid = Vec::with_capacity(out_width * out_height);
        let scale_x = self.width as f64 / out_width as f64;
        let scale_y = self.height as f64 / out_height as f64;
        let cell_area = scale_x * scale_y;

        for gy in 0..out_height {
            let y_start = gy as f64 * scale_y;
            let y_end = y_start + scale_y;
            let rows = (y_start.floor() as usize)..(y_end.ceil() as usize).min(self.height);

            for gx in 0..out_width {
                let x_start = gx as f64 * scale_x;
                let x_end = x_start + scale_x;
                let cols = (x_start.floor() as usize)..(x_end.ceil() as usize).min(self.width);

                let mut sum = 0.0;
                for py in rows.clone() {
                    let wy = Self::overlap(py, y_start, y_end);
                    if wy <= 0.0 {
                        continue;
                    }
                    let row = py * self.width;
                    for px in cols.clone() {
                        let wx = Self::overlap(px, x_start, x_end);
                        sum += wx * wy * self.pixels[row + px] as f64;
                    }
                }

                let value = sum / cell_area / MAX_INTENSITY as f64;
                grid.push(value.clamp(0.0, 1.0) as f32);
            }
        }

        grid
    }

    fn overlap(pixel: usize, start: f64, end: f64) -> f64 {
        let lo = (pixel as f64).max(start);
        let hi = ((pixel + 1) as f64).min(end);
        (hi - lo).max(0.0)
    }
}

/// Output of the spatial encoder for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEncoding {
    /// Terrain, platforms and the player, row-major `GRID_HEIGHT x GRID_WIDTH`
    pub platform_grid: Vec<f32>,
    /// Opponent and player only
    pub opponent_grid: Vec<f32>,
    /// Closeness of the two characters on each side, each in [0, 1]
    pub proximity: [f32; PROXIMITY_FEATURES],
}

/// Proximity signal for a single gap: 1 when touching, 0 past `extent / k`.
pub fn proximity_component(gap: f32, extent: f32) -> f32 {
    (1.0 - GAP_SENSITIVITY * gap.max(0.0) / extent).max(0.0)
}

/// Proximity between the player and opponent boxes along both axes.
///
/// Order: opponent right of player, player right of opponent, opponent below
/// player, player below opponent.
pub fn proximity(
    player: Rect,
    opponent: Rect,
    width: f32,
    height: f32,
) -> [f32; PROXIMITY_FEATURES] {
    [
        proximity_component(opponent.left() - player.right(), width),
        proximity_component(player.left() - opponent.right(), width),
        proximity_component(opponent.top() - player.bottom(), height),
        proximity_component(player.top() - opponent.bottom(), height),
    ]
}

/// Largest camera width or height accepted; the canvas is one pixel per unit.
const MAX_CAMERA_EXTENT: f32 = 8192.0;

/// Rasterizes the scene inside the camera bounds captured at match start.
#[derive(Debug, Clone)]
pub struct SpatialEncoder {
    camera: Rect,
    canvas_width: usize,
    canvas_height: usize,
}

impl SpatialEncoder {
    pub fn new(camera: Rect) -> Result<Self, ConfigurationError> {
        let width = camera.width();
        let height = camera.height();
        if !(width.is_finite() && width > 0.0) {
            return Err(ConfigurationError::DegenerateBounds {
                bounds: "camera",
                axis: Axis::Horizontal,
            });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(ConfigurationError::DegenerateBounds {
                bounds: "camera",
                axis: Axis::Vertical,
            });
        }
        if width > MAX_CAMERA_EXTENT || height > MAX_CAMERA_EXTENT {
            return Err(ConfigurationError::InvalidSetting {
                key: "cambounds",
                value: format!("{}x{}", width, height),
                reason: format!("camera extent exceeds {} units", MAX_CAMERA_EXTENT),
            });
        }

        Ok(Self {
            camera,
            canvas_width: (width.round() as usize).max(1),
            canvas_height: (height.round() as usize).max(1),
        })
    }

    pub fn camera(&self) -> Rect {
        self.camera
    }

    pub fn encode<S: SnapshotProvider + ?Sized>(&self, provider: &S) -> SpatialEncoding {
        self.encode_scene(
            provider.player(),
            provider.opponent(),
            provider.terrain(),
            provider.platforms(),
        )
    }

    pub fn encode_scene(
        &self,
        player: &CharacterState,
        opponent: &CharacterState,
        terrain: &[TerrainPiece],
        platforms: &[Platform],
    ) -> SpatialEncoding {
        let origin = self.camera.origin();
        let player_rect = player.bounding_rect();
        let opponent_rect = opponent.bounding_rect();

        // Player to platforms
        let mut platform_canvas = Canvas::new(self.canvas_width, self.canvas_height);
        for piece in terrain {
            platform_canvas.fill_rect(piece.rect().relative_to(origin), FOREGROUND);
        }
        for platform in platforms {
            platform_canvas.fill_rect(platform.rect().relative_to(origin), FOREGROUND);
        }
        platform_canvas.fill_rect(player_rect.relative_to(origin), PLAYER_SHADE);

        // Opponent to player
        let mut opponent_canvas = Canvas::new(self.canvas_width, self.canvas_height);
        opponent_canvas.fill_rect(opponent_rect.relative_to(origin), FOREGROUND);
        opponent_canvas.fill_rect(player_rect.relative_to(origin), PLAYER_SHADE);

        SpatialEncoding {
            platform_grid: platform_canvas.downsample(GRID_WIDTH, GRID_HEIGHT),
            opponent_grid: opponent_canvas.downsample(GRID_WIDTH, GRID_HEIGHT),
            proximity: proximity(
                player_rect,
                opponent_rect,
                self.camera.width(),
                self.camera.height(),
            ),
        }
    }
}
