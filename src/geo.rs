//! Geographic projection between screen and map coordinates.
//!
//! When the diagram is drawn over a background map, pinned entities remember
//! their longitude/latitude so that they stay on the same spot after the map
//! is resized or panned.

/// Converts between screen `(x, y)` and geographic `(lon, lat)`.
///
/// Both directions return `None` for points outside the projection's domain.
pub trait Projection {
    fn to_lon_lat(&self, x: f64, y: f64) -> Option<(f64, f64)>;
    fn to_xy(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;
}

/// Bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self {
            west: -180.0,
            east: 180.0,
            north: 85.0,
            south: -85.0,
        }
    }
}

/// Plate carrée projection of `bounds` onto a `width` x `height` canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquirectangularProjection {
    pub width: f64,
    pub height: f64,
    pub bounds: GeoBounds,
}

impl EquirectangularProjection {
    pub fn new(width: f64, height: f64, bounds: GeoBounds) -> Self {
        Self { width, height, bounds }
    }

    fn lon_span(&self) -> f64 {
        self.bounds.east - self.bounds.west
    }

    fn lat_span(&self) -> f64 {
        self.bounds.north - self.bounds.south
    }
}

impl Projection for EquirectangularProjection {
    fn to_lon_lat(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(0.0..=self.width).contains(&x) || !(0.0..=self.height).contains(&y) {
            return None;
        }
        let lon = self.bounds.west + x / self.width * self.lon_span();
        let lat = self.bounds.north - y / self.height * self.lat_span();
        Some((lon, lat))
    }

    fn to_xy(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let b = &self.bounds;
        if !(b.west..=b.east).contains(&lon) || !(b.south..=b.north).contains(&lat) {
            return None;
        }
        let x = (lon - b.west) / self.lon_span() * self.width;
        let y = (b.north - lat) / self.lat_span() * self.height;
        Some((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> EquirectangularProjection {
        EquirectangularProjection::new(720.0, 340.0, GeoBounds::default())
    }

    #[test]
    fn test_corners() {
        let p = world();
        assert_eq!(p.to_lon_lat(0.0, 0.0), Some((-180.0, 85.0)));
        assert_eq!(p.to_lon_lat(720.0, 340.0), Some((180.0, -85.0)));
        assert_eq!(p.to_xy(0.0, 0.0), Some((360.0, 170.0)));
    }

    #[test]
    fn test_out_of_domain() {
        let p = world();
        assert!(p.to_lon_lat(-1.0, 10.0).is_none());
        assert!(p.to_lon_lat(10.0, 341.0).is_none());
        assert!(p.to_xy(181.0, 0.0).is_none());
        assert!(p.to_xy(0.0, -89.0).is_none());
    }

    #[test]
    fn test_round_trip() {
        let p = world();
        let (lon, lat) = p.to_lon_lat(123.0, 45.0).unwrap();
        let (x, y) = p.to_xy(lon, lat).unwrap();
        assert!((x - 123.0).abs() < 1e-9);
        assert!((y - 45.0).abs() < 1e-9);
    }
}
