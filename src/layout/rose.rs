use super::curve::catmull_rom;
use super::types::PetalRatio;
use std::f64::consts::PI;

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Turns needed for `r = cos(n/d · θ)` to close: `d / gcd(n, d)`.
pub fn period(petals: PetalRatio) -> u32 {
    let divisor = gcd(petals.n, petals.d);
    if divisor == 0 { 0 } else { petals.d / divisor }
}

/// Samples the rose `r(θ) = radius · cos(n/d · θ)` every `step` radians over its full period,
/// plus one extra step so the outline closes.
pub fn rose_points(radius: f64, petals: PetalRatio, step: f64) -> Vec<(f64, f64)> {
    if petals.d == 0 || !(step > 0.0) {
        return Vec::new();
    }
    let k = f64::from(petals.n) / f64::from(petals.d);
    let limit = PI * 2.0 * f64::from(period(petals)) + step;
    let mut points = Vec::new();
    let mut a = 0.0f64;
    while a < limit {
        let r1 = radius * (k * a).cos();
        points.push((r1 * a.cos(), r1 * a.sin()));
        a += step;
    }
    points
}

pub fn rose_path(radius: f64, petals: PetalRatio, step: f64) -> String {
    catmull_rom(&rose_points(radius, petals, step))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(n: u32, d: u32) -> PetalRatio {
        PetalRatio { n, d }
    }

    #[test]
    fn period_uses_reduced_denominator() {
        assert_eq!(period(ratio(3, 1)), 1);
        assert_eq!(period(ratio(4, 2)), 1);
        assert_eq!(period(ratio(3, 2)), 2);
        assert_eq!(period(ratio(1, 7)), 7);
    }

    #[test]
    fn sampled_rose_closes() {
        for petals in [ratio(3, 1), ratio(4, 2), ratio(5, 3), ratio(3, 2), ratio(7, 3), ratio(1, 5)] {
            let radius = 10.0;
            let points = rose_points(radius, petals, 0.02);
            let first = points[0];
            let last = points[points.len() - 1];
            let gap = ((first.0 - last.0).powi(2) + (first.1 - last.1).powi(2)).sqrt();
            let k = f64::from(petals.n) / f64::from(petals.d);
            assert!(gap <= radius * 0.02 * (k + 1.0) * 2.0, "{petals:?} gap {gap}");
            assert!(points.iter().all(|(x, y)| x.hypot(*y) <= radius + 1e-9));
        }
    }

    #[test]
    fn zero_denominator_is_empty() {
        assert!(rose_points(5.0, ratio(3, 0), 0.02).is_empty());
        assert_eq!(rose_path(5.0, ratio(3, 0), 0.02), "");
    }

    #[test]
    fn path_starts_at_radius() {
        assert!(rose_path(12.0, ratio(1, 2), 0.02).starts_with("M12,0C"));
    }
}
