use ratatui::layout::Rect;

/// Full map extent in degrees
const WORLD_WIDTH: f64 = 360.0;
const WORLD_HEIGHT: f64 = 180.0;

/// Zoom limits for region framing
const MIN_SCALE: f64 = 1.0;
const MAX_SCALE: f64 = 8.0;

/// Share of the view the framed region should fill
const FILL: f64 = 0.9;

/// Margin around circuit coordinates so a single venue still frames its
/// surroundings (degrees)
const REGION_PADDING: f64 = 4.0;

/// Axis-aligned lon/lat box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// (lon, lat) of the south-west corner
    pub min: (f64, f64),
    /// (lon, lat) of the north-east corner
    pub max: (f64, f64),
}

impl Bounds {
    /// Smallest box containing every (lon, lat) point; `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, (x, y)| {
            Some(match acc {
                None => Bounds {
                    min: (x, y),
                    max: (x, y),
                },
                Some(b) => Bounds {
                    min: (b.min.0.min(x), b.min.1.min(y)),
                    max: (b.max.0.max(x), b.max.1.max(y)),
                },
            })
        })
    }

    pub fn padded(self, margin: f64) -> Self {
        Self {
            min: (self.min.0 - margin, self.min.1 - margin),
            max: (self.max.0 + margin, self.max.1 + margin),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.0 - self.min.0
    }

    pub fn height(&self) -> f64 {
        self.max.1 - self.min.1
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min.0 + self.max.0) / 2.0,
            (self.min.1 + self.max.1) / 2.0,
        )
    }
}

/// Pan/zoom state of the map: a center and a scale factor over the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: (f64, f64),
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::world()
    }
}

impl Viewport {
    /// The whole world, unzoomed
    pub fn world() -> Self {
        Self {
            center: (0.0, 0.0),
            scale: MIN_SCALE,
        }
    }

    /// Zoom so `bounds` fills most of the view, within [1, 8]x
    pub fn fit(bounds: Bounds) -> Self {
        let bounds = bounds.padded(REGION_PADDING);
        let extent = (bounds.width() / WORLD_WIDTH).max(bounds.height() / WORLD_HEIGHT);
        let scale = (FILL / extent).clamp(MIN_SCALE, MAX_SCALE);

        Self {
            center: clamp_center(bounds.center(), scale),
            scale,
        }
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = WORLD_WIDTH / 2.0 / self.scale;
        [self.center.0 - half, self.center.0 + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = WORLD_HEIGHT / 2.0 / self.scale;
        [self.center.1 - half, self.center.1 + half]
    }

    /// Map a terminal cell inside `area` to (lon, lat)
    pub fn cell_to_geo(&self, area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let [x_min, x_max] = self.x_bounds();
        let [y_min, y_max] = self.y_bounds();
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);

        Some((x_min + fx * (x_max - x_min), y_max - fy * (y_max - y_min)))
    }

    /// Click radius in degrees; shrinks as the map zooms in
    pub fn hit_radius(&self) -> f64 {
        6.0 / self.scale
    }
}

/// Keep the view inside the world extent
fn clamp_center((x, y): (f64, f64), scale: f64) -> (f64, f64) {
    let half_w = WORLD_WIDTH / 2.0 / scale;
    let half_h = WORLD_HEIGHT / 2.0 / scale;
    (
        x.clamp(-WORLD_WIDTH / 2.0 + half_w, WORLD_WIDTH / 2.0 - half_w),
        y.clamp(-WORLD_HEIGHT / 2.0 + half_h, WORLD_HEIGHT / 2.0 - half_h),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_bounds() {
        let view = Viewport::world();
        assert_eq!(view.x_bounds(), [-180.0, 180.0]);
        assert_eq!(view.y_bounds(), [-90.0, 90.0]);
    }

    #[test]
    fn test_single_point_zooms_to_max() {
        let bounds = Bounds::from_points([(9.28, 45.62)]).unwrap();
        let view = Viewport::fit(bounds);

        assert_eq!(view.scale, MAX_SCALE);
        assert!((view.center.0 - 9.28).abs() < 1e-9);
        assert!((view.center.1 - 45.62).abs() < 1e-9);
    }

    #[test]
    fn test_wide_region_stays_unzoomed() {
        // Spans nearly every meridian
        let bounds = Bounds::from_points([(-170.0, 20.0), (170.0, 60.0)]).unwrap();
        let view = Viewport::fit(bounds);

        assert_eq!(view.scale, MIN_SCALE);
        assert_eq!(view.center, (0.0, 0.0));
    }

    #[test]
    fn test_fit_scale_formula() {
        // 60 x 10 degrees before padding -> 68 x 18 -> extent 68/360
        let bounds = Bounds::from_points([(0.0, 0.0), (60.0, 10.0)]).unwrap();
        let view = Viewport::fit(bounds);

        let expected = 0.9 / (68.0 / 360.0);
        assert!((view.scale - expected).abs() < 1e-9);
    }

    #[test]
    fn test_center_is_clamped_near_pole() {
        let bounds = Bounds::from_points([(0.0, 89.0)]).unwrap();
        let view = Viewport::fit(bounds);

        let [_, y_max] = view.y_bounds();
        assert!(y_max <= 90.0 + 1e-9);
    }

    #[test]
    fn test_cell_to_geo() {
        let view = Viewport::world();
        let area = Rect::new(10, 5, 36, 18);

        let (lon, lat) = view.cell_to_geo(area, 10, 5).unwrap();
        assert!((lon - -175.0).abs() < 1e-9);
        assert!((lat - 85.0).abs() < 1e-9);

        let (lon, lat) = view.cell_to_geo(area, 45, 22).unwrap();
        assert!((lon - 175.0).abs() < 1e-9);
        assert!((lat - -85.0).abs() < 1e-9);

        assert!(view.cell_to_geo(area, 9, 5).is_none());
        assert!(view.cell_to_geo(area, 46, 5).is_none());
    }

    #[test]
    fn test_hit_radius_shrinks_with_zoom() {
        let zoomed = Viewport {
            center: (0.0, 0.0),
            scale: 4.0,
        };
        assert!(zoomed.hit_radius() < Viewport::world().hit_radius());
    }
}
