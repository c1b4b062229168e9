//! Delivery coverage check against the configured store location.

use thiserror::Error;

use crate::config::ShippingConfig;
use crate::geo::{GeoPoint, haversine_km};

/// Why an address failed the coverage check.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoverageError {
    /// The address has no coordinates, so distance cannot be validated.
    /// Rejected rather than silently allowed.
    #[error("address has no coordinates")]
    MissingGeo,
    /// The address is farther from the store than the delivery radius.
    #[error("address is {km:.2} km away, beyond the {radius_km} km radius")]
    OutOfRange { km: f64, radius_km: f64 },
}

/// Validates that a delivery address sits within the store's coverage radius.
///
/// This is a synchronous business-rule check, not a transient failure; callers
/// must not retry a rejection.
#[derive(Debug, Clone, Copy)]
pub struct CoverageGuard {
    store: GeoPoint,
    radius_km: f64,
}

impl CoverageGuard {
    #[must_use]
    pub const fn new(shipping: &ShippingConfig) -> Self {
        Self {
            store: GeoPoint::new(shipping.store_lat, shipping.store_lng),
            radius_km: shipping.radius_km,
        }
    }

    /// Check coverage for an address's optional coordinates.
    ///
    /// Returns the distance in kilometers so callers can price shipping
    /// without recomputing it. An address exactly at the radius is in range.
    ///
    /// # Errors
    ///
    /// - [`CoverageError::MissingGeo`] when either coordinate is absent
    /// - [`CoverageError::OutOfRange`] when the distance exceeds the radius
    pub fn check(&self, lat: Option<f64>, lng: Option<f64>) -> Result<f64, CoverageError> {
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Err(CoverageError::MissingGeo);
        };
        let km = haversine_km(self.store, GeoPoint::new(lat, lng));
        if km > self.radius_km {
            return Err(CoverageError::OutOfRange {
                km,
                radius_km: self.radius_km,
            });
        }
        Ok(km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping(radius_km: f64) -> ShippingConfig {
        ShippingConfig {
            store_lat: 0.0,
            store_lng: 0.0,
            radius_km,
            base: 2000,
            per_km: 400,
            min: 5000,
        }
    }

    #[test]
    fn missing_coordinates_are_rejected() {
        let guard = CoverageGuard::new(&shipping(12.0));
        assert_eq!(guard.check(None, None), Err(CoverageError::MissingGeo));
        assert_eq!(guard.check(Some(1.0), None), Err(CoverageError::MissingGeo));
        assert_eq!(guard.check(None, Some(1.0)), Err(CoverageError::MissingGeo));
    }

    #[test]
    fn address_inside_radius_passes() {
        let guard = CoverageGuard::new(&shipping(12.0));
        let km = guard.check(Some(0.05), Some(0.0)).expect("in range");
        assert!(km > 0.0 && km < 12.0);
    }

    #[test]
    fn boundary_is_inclusive() {
        // Measure the distance first, then make the radius exactly that
        // distance: the same address must pass, and must fail once the radius
        // shrinks by an epsilon.
        let addr_lat = 0.09;
        let km = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(addr_lat, 0.0));

        let at = CoverageGuard::new(&shipping(km));
        assert!(at.check(Some(addr_lat), Some(0.0)).is_ok());

        let just_under = CoverageGuard::new(&shipping(km - 1e-9));
        assert!(matches!(
            just_under.check(Some(addr_lat), Some(0.0)),
            Err(CoverageError::OutOfRange { .. })
        ));
    }

    #[test]
    fn far_address_reports_distance() {
        let guard = CoverageGuard::new(&shipping(10.0));
        let err = guard.check(Some(1.0), Some(1.0)).expect_err("out of range");
        match err {
            CoverageError::OutOfRange { km, radius_km } => {
                assert!(km > 100.0);
                assert!((radius_km - 10.0).abs() < f64::EPSILON);
            }
            CoverageError::MissingGeo => panic!("wrong error"),
        }
    }
}
