use serde::{Deserialize, Serialize};

use crate::complex::Complex;

/// Bailout radius: once `|z|` exceeds this the orbit is divergent.
pub const ESCAPE_RADIUS: f64 = 2.0;

/// Outcome of iterating a single point.
///
/// `Bounded` is a tagged case rather than a reserved count, so it can never
/// be confused with a real escape index (including 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeTime {
    /// `|z|` exceeded the bailout radius at this 0-based iteration index.
    Escaped(u32),

    /// The orbit stayed within the radius for the whole iteration budget.
    Bounded,
}

impl EscapeTime {
    /// The escape index, or `None` for bounded points.
    #[inline]
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Escaped(n) => Some(n),
            Self::Bounded => None,
        }
    }

    #[inline]
    pub fn is_bounded(self) -> bool {
        matches!(self, Self::Bounded)
    }
}

/// Which escape-time map is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FractalMode {
    /// The additive constant is the pixel's own plane coordinate.
    #[default]
    Mandelbrot,

    /// The additive constant is fixed for every pixel.
    Julia { c: Complex },
}

impl FractalMode {
    /// The fixed additive constant, if any.
    #[inline]
    pub fn julia_param(self) -> Option<Complex> {
        match self {
            Self::Mandelbrot => None,
            Self::Julia { c } => Some(c),
        }
    }

    /// Iterate a single plane point under this mode.
    #[inline]
    pub fn iterate(self, point: Complex, max_iterations: u32) -> EscapeTime {
        escape_iteration(point, self.julia_param(), max_iterations)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia { .. } => "Julia",
        }
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
///
/// Closed-form membership test; every such point is bounded, so skipping
/// the loop cannot change the result.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) < 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im < 0.0625
}

/// Escape-time iteration of `z → z² + k`, starting from `z = c`.
///
/// `k` is `c` itself (Mandelbrot mode, `julia == None`) or the fixed Julia
/// parameter. After each step `|z|` is compared against [`ESCAPE_RADIUS`];
/// the index of the first step that exceeds it is returned. All arithmetic
/// is `f64`, and the function is total over finite inputs.
pub fn escape_iteration(c: Complex, julia: Option<Complex>, max_iterations: u32) -> EscapeTime {
    let k = match julia {
        Some(k) => k,
        None => {
            if in_cardioid(c.real, c.imag) || in_period2_bulb(c.real, c.imag) {
                return EscapeTime::Bounded;
            }
            c
        }
    };

    let mut z = c;
    for i in 0..max_iterations {
        z = z.square() + k;
        if z.norm() > ESCAPE_RADIUS {
            return EscapeTime::Escaped(i);
        }
    }
    EscapeTime::Bounded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_bounded_at_any_budget() {
        for max in [1, 2, 10, 255, 10_000] {
            assert_eq!(escape_iteration(Complex::ZERO, None, max), EscapeTime::Bounded);
        }
    }

    #[test]
    fn outside_radius_escapes_immediately() {
        for c in [
            Complex::new(2.01, 0.0),
            Complex::new(-2.5, 0.0),
            Complex::new(0.0, 3.0),
            Complex::new(1.5, 1.5),
            Complex::new(-100.0, 40.0),
        ] {
            assert_eq!(escape_iteration(c, None, 255), EscapeTime::Escaped(0), "c = {c}");
        }
    }

    #[test]
    fn known_escape_count() {
        // z₀ = 1, z₁ = 1 + 1 = 2 (|2| is not > 2), z₂ = 4 + 1 = 5 → escapes at index 1.
        assert_eq!(escape_iteration(Complex::new(1.0, 0.0), None, 255), EscapeTime::Escaped(1));
    }

    #[test]
    fn budget_exhaustion_is_bounded() {
        // c = 0.3 escapes slowly; with a budget of 1 it has not escaped yet.
        let c = Complex::new(0.3, 0.0);
        assert_eq!(escape_iteration(c, None, 1), EscapeTime::Bounded);
        assert!(matches!(escape_iteration(c, None, 1000), EscapeTime::Escaped(_)));
    }

    #[test]
    fn period_two_centre_is_bounded() {
        assert_eq!(escape_iteration(Complex::new(-1.0, 0.0), None, 500), EscapeTime::Bounded);
    }

    #[test]
    fn cardioid_shortcut_agrees_with_loop() {
        // Points well inside the cardioid and bulb are bounded by the loop as well.
        for c in [Complex::new(-0.1, 0.1), Complex::new(0.2, 0.0), Complex::new(-1.05, 0.05)] {
            let mut z = c;
            let mut escaped = false;
            for _ in 0..2000 {
                z = z.square() + c;
                if z.norm() > ESCAPE_RADIUS {
                    escaped = true;
                    break;
                }
            }
            assert!(!escaped);
            assert_eq!(escape_iteration(c, None, 2000), EscapeTime::Bounded);
        }
    }

    #[test]
    fn julia_uses_fixed_constant() {
        // With k = 0 the map is z → z², so the unit disc interior is bounded.
        assert_eq!(
            escape_iteration(Complex::new(0.5, 0.5), Some(Complex::ZERO), 100),
            EscapeTime::Bounded
        );
        // The same point escapes in Mandelbrot mode.
        assert!(matches!(
            escape_iteration(Complex::new(0.5, 0.5), None, 100),
            EscapeTime::Escaped(_)
        ));
        // z₀ = 1.5: 2.25 > 2 escapes at index 0.
        assert_eq!(
            escape_iteration(Complex::new(1.5, 0.0), Some(Complex::ZERO), 100),
            EscapeTime::Escaped(0)
        );
    }

    #[test]
    fn mode_dispatch() {
        let julia = FractalMode::Julia {
            c: Complex::new(-0.7, 0.27015),
        };
        assert_eq!(julia.julia_param(), Some(Complex::new(-0.7, 0.27015)));
        assert_eq!(FractalMode::Mandelbrot.julia_param(), None);
        assert_eq!(
            FractalMode::Mandelbrot.iterate(Complex::ZERO, 50),
            escape_iteration(Complex::ZERO, None, 50)
        );
        assert_eq!(julia.label(), "Julia");
    }

    #[test]
    fn count_accessor() {
        assert_eq!(EscapeTime::Escaped(0).count(), Some(0));
        assert_eq!(EscapeTime::Bounded.count(), None);
        assert!(EscapeTime::Bounded.is_bounded());
    }

    #[test]
    fn deterministic_results() {
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-2.0, 0.0),
            Complex::new(1.0, 1.0),
        ];
        let run1: Vec<_> = points.iter().map(|&c| escape_iteration(c, None, 300)).collect();
        let run2: Vec<_> = points.iter().map(|&c| escape_iteration(c, None, 300)).collect();
        assert_eq!(run1, run2);
    }

    #[test]
    fn mode_serializes_tagged() {
        let json = serde_json::to_string(&FractalMode::Julia { c: Complex::new(0.5, -0.5) }).unwrap();
        assert_eq!(json, r#"{"kind":"julia","c":{"real":0.5,"imag":-0.5}}"#);
        let back: FractalMode = serde_json::from_str(r#"{"kind":"mandelbrot"}"#).unwrap();
        assert_eq!(back, FractalMode::Mandelbrot);
    }
}
