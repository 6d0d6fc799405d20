//! Circular (angular) statistics
//!
//! Directions live on a circle; averaging 350° and 10° must give ≈0°, not
//! 180°. Every mean here decomposes angles into sine/cosine components,
//! averages those, and re-derives the angle, so wraparound at 0°/360° never
//! distorts the result. A naive arithmetic mean of angles is never valid.

/// Normalize an angle into [0°, 360°)
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// Weighted circular mean of (angle°, weight) pairs
///
/// Returns `None` for an empty slice. Zero total weight falls back to the
/// unweighted circular mean.
pub fn weighted_circular_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    // a single angle is its own mean; skip the vector round-trip
    if pairs.len() == 1 {
        return Some(normalize_deg(pairs[0].0));
    }

    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    let (sin_sum, cos_sum) = if total_weight > 0.0 {
        pairs.iter().fold((0.0, 0.0), |(s, c), (deg, w)| {
            let rad = deg.to_radians();
            (s + w * rad.sin(), c + w * rad.cos())
        })
    } else {
        pairs.iter().fold((0.0, 0.0), |(s, c), (deg, _)| {
            let rad = deg.to_radians();
            (s + rad.sin(), c + rad.cos())
        })
    };

    Some(normalize_deg(sin_sum.atan2(cos_sum).to_degrees()))
}

/// Unweighted circular mean of angles in degrees
pub fn circular_mean(degs: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = degs.iter().map(|d| (*d, 1.0)).collect();
    weighted_circular_mean(&pairs)
}

/// Circular variance in [0,1]: 0 = all angles identical, 1 = fully dispersed
///
/// Defined as 1 − R where R is the mean resultant length of the unit
/// vectors.
pub fn circular_variance(degs: &[f64]) -> Option<f64> {
    if degs.is_empty() {
        return None;
    }

    let n = degs.len() as f64;
    let (sin_sum, cos_sum) = degs.iter().fold((0.0, 0.0), |(s, c), deg| {
        let rad = deg.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let resultant = (sin_sum * sin_sum + cos_sum * cos_sum).sqrt() / n;

    Some((1.0 - resultant).clamp(0.0, 1.0))
}

/// Signed angular difference a − b, wrapped to [−180°, 180°]
pub fn angular_difference(a_deg: f64, b_deg: f64) -> f64 {
    let mut diff = (a_deg - b_deg) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_across_north_wrap() {
        // 350° and 10° average to 0°, not 180°
        let mean = circular_mean(&[350.0, 10.0]).unwrap();
        assert!(mean < 0.001 || mean > 359.999, "got {}", mean);
    }

    #[test]
    fn test_mean_of_plain_angles() {
        let mean = circular_mean(&[330.0, 335.0]).unwrap();
        assert!((mean - 332.5).abs() < 0.001);
    }

    #[test]
    fn test_weighted_mean_leans_toward_heavier_source() {
        let balanced = weighted_circular_mean(&[(330.0, 1.0), (340.0, 1.0)]).unwrap();
        let skewed = weighted_circular_mean(&[(330.0, 3.0), (340.0, 1.0)]).unwrap();
        assert!((balanced - 335.0).abs() < 0.001);
        assert!(skewed < balanced);
        assert!(skewed > 330.0);
    }

    #[test]
    fn test_zero_weights_fall_back_to_unweighted() {
        let mean = weighted_circular_mean(&[(350.0, 0.0), (10.0, 0.0)]).unwrap();
        assert!(mean < 0.001 || mean > 359.999, "got {}", mean);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(circular_mean(&[]).is_none());
        assert!(weighted_circular_mean(&[]).is_none());
        assert!(circular_variance(&[]).is_none());
    }

    #[test]
    fn test_variance_identical_angles_is_zero() {
        let v = circular_variance(&[45.0, 45.0, 45.0]).unwrap();
        assert!(v < 1e-9);
    }

    #[test]
    fn test_variance_opposed_angles_is_one() {
        let v = circular_variance(&[0.0, 180.0]).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_angular_difference_wraps() {
        assert!((angular_difference(350.0, 10.0) - (-20.0)).abs() < 1e-9);
        assert!((angular_difference(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((angular_difference(180.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((angular_difference(90.0, 90.0)).abs() < 1e-9);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_deg(360.0), 0.0);
        assert_eq!(normalize_deg(-10.0), 350.0);
        assert_eq!(normalize_deg(725.0), 5.0);
    }
}
