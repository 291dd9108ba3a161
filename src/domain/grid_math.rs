// Grid <-> pixel conversion
use super::breakpoint::LayoutProfile;
use super::geometry::PixelPoint;

/// Coordinate conversion for one profile at one viewport width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMath {
    profile: LayoutProfile,
    viewport_width: f64,
}

impl GridMath {
    pub fn new(profile: LayoutProfile, viewport_width: f64) -> Self {
        Self {
            profile: profile.sanitized(),
            viewport_width,
        }
    }

    /// Floored at one pixel so degenerate viewports never divide by zero.
    pub fn column_width(&self) -> f64 {
        let usable = self.viewport_width - 2.0 * f64::from(self.profile.margin.x);
        (usable / f64::from(self.profile.columns)).max(1.0)
    }

    pub fn row_height(&self) -> f64 {
        f64::from(self.profile.row_height)
    }

    pub fn grid_to_pixel(&self, x: u32, y: u32) -> PixelPoint {
        PixelPoint::new(
            f64::from(self.profile.margin.x) + f64::from(x) * self.column_width(),
            f64::from(self.profile.margin.y) + f64::from(y) * self.row_height(),
        )
    }

    /// Nearest grid cell to a pixel position. May be negative or past the
    /// last column; callers clamp.
    pub fn pixel_to_grid(&self, point: PixelPoint) -> (i64, i64) {
        let x = (point.x - f64::from(self.profile.margin.x)) / self.column_width();
        let y = (point.y - f64::from(self.profile.margin.y)) / self.row_height();
        (x.round() as i64, y.round() as i64)
    }

    /// Pixel delta rounded to whole grid units.
    pub fn pixel_delta_to_grid(&self, delta: PixelPoint) -> (i64, i64) {
        (
            (delta.x / self.column_width()).round() as i64,
            (delta.y / self.row_height()).round() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::breakpoint::{Breakpoint, Spacing};
    use proptest::prelude::*;

    fn lg_math() -> GridMath {
        GridMath::new(Breakpoint::Lg.default_profile(), 1280.0)
    }

    #[test]
    fn test_column_width() {
        // (1280 - 2 * 16) / 12
        assert_eq!(lg_math().column_width(), 104.0);
    }

    #[test]
    fn test_grid_to_pixel() {
        let math = lg_math();
        assert_eq!(math.grid_to_pixel(0, 0), PixelPoint::new(16.0, 16.0));
        assert_eq!(math.grid_to_pixel(2, 3), PixelPoint::new(224.0, 196.0));
    }

    #[test]
    fn test_pixel_to_grid_rounds_to_nearest_cell() {
        let math = lg_math();
        assert_eq!(math.pixel_to_grid(PixelPoint::new(16.0 + 51.0, 16.0 + 29.0)), (0, 0));
        assert_eq!(math.pixel_to_grid(PixelPoint::new(16.0 + 53.0, 16.0 + 31.0)), (1, 1));
        assert_eq!(math.pixel_to_grid(PixelPoint::new(-200.0, 0.0)), (-2, 0));
    }

    #[test]
    fn test_degenerate_viewport_does_not_divide_by_zero() {
        let profile = LayoutProfile::new(12, 60, Spacing::uniform(16), Spacing::uniform(0));
        let math = GridMath::new(profile, 10.0);
        assert_eq!(math.column_width(), 1.0);
        assert_eq!(math.pixel_to_grid(PixelPoint::new(20.0, 16.0)), (4, 0));
    }

    #[test]
    fn test_pixel_delta_to_grid() {
        let math = lg_math();
        assert_eq!(math.pixel_delta_to_grid(PixelPoint::new(208.0, 60.0)), (2, 1));
        assert_eq!(math.pixel_delta_to_grid(PixelPoint::new(-150.0, -100.0)), (-1, -2));
    }

    proptest! {
        #[test]
        fn grid_pixel_round_trip(
            x in 0u32..12,
            y in 0u32..500,
            viewport in 600.0f64..4000.0,
        ) {
            let math = GridMath::new(Breakpoint::Lg.default_profile(), viewport);
            let (gx, gy) = math.pixel_to_grid(math.grid_to_pixel(x, y));
            prop_assert_eq!((gx, gy), (i64::from(x), i64::from(y)));
        }
    }
}
