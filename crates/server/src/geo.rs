//! Great-circle distance and tiered shipping cost.
//!
//! Pure functions, no side effects. Coverage enforcement that builds on these
//! lives in [`crate::coverage`].

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine great-circle distance between two points, in kilometers.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Tiered shipping cost for a distance, in integer pesos.
///
/// `max(min, base + per_km * km)`, rounded to the nearest peso. The floor
/// guarantees a minimum fee regardless of proximity while the linear term
/// scales with distance beyond the base tier.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn shipping_for_km(km: f64, base: i64, per_km: i64, min: i64) -> i64 {
    let raw = (base as f64 + per_km as f64 * km).round() as i64;
    raw.max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Latitude offset (degrees) that sits exactly `km` kilometers from the
    /// equator along a meridian, under the haversine model.
    fn lat_for_km(km: f64) -> f64 {
        km / (EARTH_RADIUS_KM * std::f64::consts::PI / 180.0)
    }

    #[test]
    fn zero_distance_between_identical_points() {
        let p = GeoPoint::new(5.6339, -73.5256);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(4.711, -74.0721);
        let b = GeoPoint::new(5.6339, -73.5256);
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn meridian_distance_matches_arc_length() {
        let store = GeoPoint::new(0.0, 0.0);
        let addr = GeoPoint::new(lat_for_km(8.0), 0.0);
        let km = haversine_km(store, addr);
        assert!((km - 8.0).abs() < 1e-6, "got {km}");
    }

    #[test]
    fn bogota_to_villa_de_leyva_is_plausible() {
        // ~115 km as the crow flies
        let bogota = GeoPoint::new(4.711, -74.0721);
        let villa = GeoPoint::new(5.6339, -73.5256);
        let km = haversine_km(bogota, villa);
        assert!((100.0..130.0).contains(&km), "got {km}");
    }

    #[test]
    fn shipping_floor_applies_at_zero_distance() {
        assert_eq!(shipping_for_km(0.0, 2000, 400, 5000), 5000);
    }

    #[test]
    fn shipping_scales_past_the_floor() {
        // base=2000, perKm=400, min=5000: at 8 km -> 5200
        assert_eq!(shipping_for_km(8.0, 2000, 400, 5000), 5200);
    }

    #[test]
    fn shipping_is_monotonic_in_distance() {
        let mut prev = shipping_for_km(0.0, 2000, 400, 5000);
        for tenths in 1..=300 {
            let km = f64::from(tenths) / 10.0;
            let cost = shipping_for_km(km, 2000, 400, 5000);
            assert!(cost >= prev, "cost decreased at {km} km");
            prev = cost;
        }
    }

    #[test]
    fn shipping_rounds_to_nearest_peso() {
        assert_eq!(shipping_for_km(8.001, 2000, 400, 5000), 5200);
        assert_eq!(shipping_for_km(8.6, 2000, 400, 5000), 5440);
    }
}
