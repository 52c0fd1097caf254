//! Character constants for raster output.

/// Upper half block: foreground paints the top pixel, background the bottom.
pub const UPPER_HALF: char = '▀';

/// Pixels stacked in one terminal cell.
pub const PIXELS_PER_CELL: u16 = 2;
