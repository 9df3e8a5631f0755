//! Transform functions applied on the way into and out of the registry
//!
//! Every parameter carries an input transform (controller value -> raw) and an
//! output transform (raw -> value delivered to observers). Both are plain
//! `f64 -> f64` functions; [`Curve`] supplies the stock forward/inverse pairs:
//!
//! | curve          | forward(x)                         | inverse(y)                  |
//! |----------------|------------------------------------|-----------------------------|
//! | `linear`       | x                                  | y                           |
//! | `logarithmic`  | 10^((-60 + 66x) / 20)              | (20 log10 y + 60) / 66      |
//! | `decibel`      | same, over `[min_db, max_db]`      | same                        |
//! | `exponential`  | (e^x - 1) / (e - 1)                | ln(1 + y(e - 1))            |
//! | `square_root`  | sqrt(x)                            | y^2                         |
//! | `cubic`        | x^3                                | cbrt(y)                     |
//! | `sine`         | sin(x pi/2)                        | asin(y) 2/pi                |
//! | `inverse_sine` | asin(x) 2/pi                       | sin(y pi/2)                 |
//! | `piecewise`    | interpolate sorted control points  | interpolate on y            |

use crate::error::{ParameterError, ParameterResult};
use crate::parameter::Scale;
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, FRAC_PI_2};
use std::fmt;
use std::sync::Arc;

/// Lower bound of the fixed logarithmic curve
pub const LOG_MIN_DB: f64 = -60.0;
/// Upper bound of the fixed logarithmic curve
pub const LOG_MAX_DB: f64 = 6.0;

/// A pure, shareable `f64 -> f64` function
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl TransformFn {
    /// Wrap an arbitrary function
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// The identity function
    pub fn identity() -> Self {
        Self::new(|x| x)
    }

    /// Evaluate the function
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (self.0)(value)
    }
}

impl Default for TransformFn {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformFn")
    }
}

/// Forward/inverse function pair
#[derive(Debug, Clone, Default)]
pub struct TransformPair {
    pub forward: TransformFn,
    pub inverse: TransformFn,
}

impl TransformPair {
    pub fn new(forward: TransformFn, inverse: TransformFn) -> Self {
        Self { forward, inverse }
    }
}

/// Stock transform curves
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    #[default]
    Linear,
    /// Fixed -60 dB .. +6 dB gain curve
    Logarithmic,
    /// Gain curve over a custom dB range
    Decibel { min_db: f64, max_db: f64 },
    Exponential,
    SquareRoot,
    Cubic,
    Sine,
    InverseSine,
    /// Piecewise-linear table
    Piecewise { points: PiecewiseLinear },
}

impl Curve {
    /// Map a controller-domain value forward
    pub fn forward(&self, x: f64) -> f64 {
        match self {
            Curve::Linear => x,
            Curve::Logarithmic => db_forward(x, LOG_MIN_DB, LOG_MAX_DB),
            Curve::Decibel { min_db, max_db } => db_forward(x, *min_db, *max_db),
            Curve::Exponential => (x.exp() - 1.0) / (E - 1.0),
            Curve::SquareRoot => x.max(0.0).sqrt(),
            Curve::Cubic => x * x * x,
            Curve::Sine => (x * FRAC_PI_2).sin(),
            Curve::InverseSine => x.clamp(-1.0, 1.0).asin() / FRAC_PI_2,
            Curve::Piecewise { points } => points.forward(x),
        }
    }

    /// Undo [`Curve::forward`]
    pub fn inverse(&self, y: f64) -> f64 {
        match self {
            Curve::Linear => y,
            Curve::Logarithmic => db_inverse(y, LOG_MIN_DB, LOG_MAX_DB),
            Curve::Decibel { min_db, max_db } => db_inverse(y, *min_db, *max_db),
            Curve::Exponential => (1.0 + y * (E - 1.0)).max(f64::MIN_POSITIVE).ln(),
            Curve::SquareRoot => y.max(0.0).powi(2),
            Curve::Cubic => y.cbrt(),
            Curve::Sine => y.clamp(-1.0, 1.0).asin() / FRAC_PI_2,
            Curve::InverseSine => (y * FRAC_PI_2).sin(),
            Curve::Piecewise { points } => points.inverse(y),
        }
    }

    /// Check curve parameters that deserialization alone cannot
    ///
    /// A decibel curve needs finite bounds with `min_db < max_db`; otherwise
    /// its inverse divides by zero.
    pub fn validate(&self) -> ParameterResult<()> {
        match *self {
            Curve::Decibel { min_db, max_db }
                if !(min_db.is_finite() && max_db.is_finite() && min_db < max_db) =>
            {
                Err(ParameterError::InvalidDecibelRange { min_db, max_db })
            }
            _ => Ok(()),
        }
    }

    /// Descriptive scale tag for this curve
    pub fn scale(&self) -> Scale {
        match self {
            Curve::Linear => Scale::Linear,
            Curve::Logarithmic => Scale::Logarithmic,
            Curve::Decibel { .. } => Scale::Decibel,
            Curve::Exponential => Scale::Exponential,
            Curve::SquareRoot => Scale::SquareRoot,
            Curve::Cubic => Scale::Cubic,
            Curve::Sine => Scale::Sine,
            Curve::InverseSine => Scale::InverseSine,
            Curve::Piecewise { .. } => Scale::Piecewise,
        }
    }

    /// Owned forward/inverse function pair
    pub fn pair(&self) -> TransformPair {
        let fwd = self.clone();
        let inv = self.clone();
        TransformPair::new(
            TransformFn::new(move |x| fwd.forward(x)),
            TransformFn::new(move |y| inv.inverse(y)),
        )
    }
}

fn db_forward(x: f64, min_db: f64, max_db: f64) -> f64 {
    let db = min_db + x * (max_db - min_db);
    10f64.powf(db / 20.0)
}

fn db_inverse(y: f64, min_db: f64, max_db: f64) -> f64 {
    let db = 20.0 * y.max(f64::MIN_POSITIVE).log10();
    (db - min_db) / (max_db - min_db)
}

/// One `{x, y}` entry of a piecewise table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
}

impl ControlPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Piecewise-linear curve through sorted control points
///
/// Points are sorted by `x`; for duplicate `x` the first point after sorting
/// is kept. Outside the table the curve holds the end values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ControlPoint>", into = "Vec<ControlPoint>")]
pub struct PiecewiseLinear {
    points: Vec<ControlPoint>,
}

impl PiecewiseLinear {
    pub fn new(mut points: Vec<ControlPoint>) -> ParameterResult<Self> {
        if points.is_empty() {
            return Err(ParameterError::EmptyCurve);
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ParameterError::NonFinitePoint { x: p.x, y: p.y });
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        points.dedup_by(|later, earlier| later.x == earlier.x);
        Ok(Self { points })
    }

    /// Sorted, de-duplicated control points
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn forward(&self, x: f64) -> f64 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x.is_nan() || x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            if x <= b.x {
                let t = (x - a.x) / (b.x - a.x);
                return a.y + t * (b.y - a.y);
            }
        }
        last.y
    }

    /// Inverse lookup on `y`
    ///
    /// Non-monotonic tables resolve to the first segment containing `y`.
    /// A `y` outside every segment maps to the point with the nearest `y`.
    pub fn inverse(&self, y: f64) -> f64 {
        if self.points.len() == 1 {
            return self.points[0].x;
        }
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let (lo, hi) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };
            if y >= lo && y <= hi {
                if a.y == b.y {
                    return a.x;
                }
                let t = (y - a.y) / (b.y - a.y);
                return a.x + t * (b.x - a.x);
            }
        }
        self.points
            .iter()
            .min_by(|p, q| (p.y - y).abs().total_cmp(&(q.y - y).abs()))
            .map(|p| p.x)
            .unwrap_or(0.0)
    }
}

impl TryFrom<Vec<ControlPoint>> for PiecewiseLinear {
    type Error = ParameterError;

    fn try_from(points: Vec<ControlPoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PiecewiseLinear> for Vec<ControlPoint> {
    fn from(curve: PiecewiseLinear) -> Self {
        curve.points
    }
}
