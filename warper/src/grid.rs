use frame_catalog::Bounds;
use gdal::GeoTransform;

/// Pixel size in target units. `y` keeps its sign; north-up grids have it negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

impl Resolution {
    pub fn from_geo_transform(gt: &GeoTransform) -> Resolution {
        Resolution { x: gt[1], y: gt[5] }
    }
}

/// Neumaier summation.
fn compensated_sum(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, compensation) = values.fold((0.0_f64, 0.0_f64), |(sum, c), v| {
        let t = sum + v;
        let c = if sum.abs() >= v.abs() {
            c + ((sum - t) + v)
        } else {
            c + ((v - t) + sum)
        };
        (t, c)
    });
    sum + compensation
}

/// Arithmetic mean of each component, `None` when there is nothing to average.
pub fn mean_resolution(resolutions: &[Resolution]) -> Option<Resolution> {
    if resolutions.is_empty() {
        return None;
    }
    let n = resolutions.len() as f64;
    let x = compensated_sum(resolutions.iter().map(|r| r.x));
    let y = compensated_sum(resolutions.iter().map(|r| r.y));

    Some(Resolution { x: x / n, y: y / n })
}

/// Raster dimensions plus the north-up geo transform placing them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    pub geo_transform: GeoTransform,
}

impl Grid {
    /// Smallest grid of `resolution` sized cells anchored at the upper-left
    /// corner of `bounds` that covers all of it.
    pub fn covering(bounds: &Bounds, resolution: Resolution) -> Grid {
        let xres = resolution.x;
        let yres = resolution.y.abs();

        Grid {
            cols: (bounds.width() / xres).ceil() as usize,
            rows: (bounds.height() / yres).ceil() as usize,
            geo_transform: [bounds.xmin, xres, 0.0, bounds.ymax, 0.0, -yres],
        }
    }

    /// Like [Grid::covering] but never smaller than one pixel.
    pub fn fitting(bounds: &Bounds, resolution: Resolution) -> Grid {
        let grid = Grid::covering(bounds, resolution);
        Grid {
            cols: grid.cols.max(1),
            rows: grid.rows.max(1),
            ..grid
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_geo_transform(&self.geo_transform)
    }

    pub fn bounds(&self) -> Bounds {
        let gt = &self.geo_transform;
        Bounds {
            xmin: gt[0],
            ymin: gt[3] + self.rows as f64 * gt[5],
            xmax: gt[0] + self.cols as f64 * gt[1],
            ymax: gt[3],
        }
    }
}
