//! Core types for luag-panel.
//!
//! Geometry shared by the sampler, the transform and the panels, plus the
//! display snapshot that carries the host's scaling for a single tick.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// =============================================================================
// Logical coordinates
// =============================================================================

/// Pointer position in panel-relative logical units.
///
/// Derived every tick from the raw device position. Values may be negative
/// or past the panel extent; the bounds test rejects them downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct LogicalPoint {
    pub x: i32,
    pub y: i32,
}

impl LogicalPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Panel bounds
// =============================================================================

/// Rectangle occupied by a panel, in logical console units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PanelBounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner of the panel in console coordinates.
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Whether a panel-relative point falls inside the panel.
    ///
    /// The point is relative to [`origin`](Self::origin), so the valid range
    /// is `0..width` by `0..height`.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= 0 && py >= 0 && px < self.width && py < self.height
    }
}

// =============================================================================
// Console configuration
// =============================================================================

/// Logical resolution of the virtual console.
///
/// Hosts may embed this in their own configuration files; nothing in this
/// crate reads or writes it from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub width: u32,
    pub height: u32,
}

impl ConsoleConfig {
    pub const DEFAULT_WIDTH: u32 = 160;
    pub const DEFAULT_HEIGHT: u32 = 160;
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

// =============================================================================
// Display snapshot
// =============================================================================

/// Read-only view of the host's display geometry for one tick.
///
/// Maps physical window coordinates onto the logical console: the console is
/// drawn at `scaled_width` x `scaled_height` starting at `offset`. Every
/// constructor validates its input, so a snapshot never carries a zero or
/// negative scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySnapshot {
    logical_width: i32,
    logical_height: i32,
    scaled_width: i32,
    scaled_height: i32,
    offset_x: i32,
    offset_y: i32,
}

impl DisplaySnapshot {
    /// Build a snapshot from explicit sizes and offset.
    pub fn new(
        logical: (i32, i32),
        scaled: (i32, i32),
        offset: (i32, i32),
    ) -> Result<Self, ConfigError> {
        let (logical_width, logical_height) = logical;
        let (scaled_width, scaled_height) = scaled;

        if logical_width <= 0 || logical_height <= 0 {
            return Err(ConfigError::InvalidLogicalSize {
                width: logical_width as i64,
                height: logical_height as i64,
            });
        }
        if scaled_width <= 0 || scaled_height <= 0 {
            return Err(ConfigError::InvalidScaledSize {
                width: scaled_width,
                height: scaled_height,
            });
        }

        Ok(Self {
            logical_width,
            logical_height,
            scaled_width,
            scaled_height,
            offset_x: offset.0,
            offset_y: offset.1,
        })
    }

    /// Scale the console by an integer factor with no letterboxing.
    pub fn scaled(
        config: &ConsoleConfig,
        factor: i32,
        offset: (i32, i32),
    ) -> Result<Self, ConfigError> {
        let (width, height) = logical_size(config)?;
        Self::new(
            (width, height),
            (width.saturating_mul(factor), height.saturating_mul(factor)),
            offset,
        )
    }

    /// Fit the console into a window, keeping its aspect ratio and centring it.
    ///
    /// The limiting axis fills the window; the other axis gets equal bars on
    /// both sides.
    pub fn letterbox(
        window_width: i32,
        window_height: i32,
        config: &ConsoleConfig,
    ) -> Result<Self, ConfigError> {
        if window_width <= 0 || window_height <= 0 {
            return Err(ConfigError::InvalidWindow {
                width: window_width,
                height: window_height,
            });
        }
        let (width, height) = logical_size(config)?;

        let (ww, wh) = (window_width as i64, window_height as i64);
        let (lw, lh) = (width as i64, height as i64);

        // Compare aspect ratios without dividing: ww / wh <= lw / lh
        let (scaled_w, scaled_h) = if ww * lh <= wh * lw {
            (ww, ww * lh / lw)
        } else {
            (wh * lw / lh, wh)
        };

        if scaled_w == 0 || scaled_h == 0 {
            return Err(ConfigError::WindowTooSmall {
                width: window_width,
                height: window_height,
            });
        }

        let offset = (((ww - scaled_w) / 2) as i32, ((wh - scaled_h) / 2) as i32);
        Self::new((width, height), (scaled_w as i32, scaled_h as i32), offset)
    }

    pub fn logical_size(&self) -> (i32, i32) {
        (self.logical_width, self.logical_height)
    }

    pub fn scaled_size(&self) -> (i32, i32) {
        (self.scaled_width, self.scaled_height)
    }

    /// Physical position of the console's top-left corner.
    pub fn display_offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    /// Ratio of scaled to logical width.
    pub fn scale_factor(&self) -> f64 {
        self.scaled_width as f64 / self.logical_width as f64
    }
}

fn logical_size(config: &ConsoleConfig) -> Result<(i32, i32), ConfigError> {
    let width = i32::try_from(config.width).unwrap_or(0);
    let height = i32::try_from(config.height).unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidLogicalSize {
            width: config.width as i64,
            height: config.height as i64,
        });
    }
    Ok((width, height))
}

// =============================================================================
// Tests
// =============================================================================
