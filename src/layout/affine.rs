use crate::scene::num;
use serde::Serialize;
use std::f64::consts::PI;

/// A 2D affine matrix `[a, b, c, d, tx, ty]` stored in single precision.
///
/// Every operation widens the stored values, computes in `f64` and rounds the result back to
/// `f32`, which reproduces the output of a `Float32Array` backed matrix library exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Affine(pub [f32; 6]);

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(self, x: f64, y: f64) -> Self {
        let a = self.0.map(f64::from);
        let v0 = f64::from(x as f32);
        let v1 = f64::from(y as f32);
        let mut out = self.0;
        out[4] = (a[0] * v0 + a[2] * v1 + a[4]) as f32;
        out[5] = (a[1] * v0 + a[3] * v1 + a[5]) as f32;
        Affine(out)
    }

    /// Rotates by `degrees`, clockwise in SVG's y-down space.
    pub fn rotate(self, degrees: f64) -> Self {
        let rad = degrees * (PI / 180.0);
        let a = self.0.map(f64::from);
        let s = rad.sin();
        let c = rad.cos();
        Affine([
            (a[0] * c + a[2] * s) as f32,
            (a[1] * c + a[3] * s) as f32,
            (a[0] * -s + a[2] * c) as f32,
            (a[1] * -s + a[3] * c) as f32,
            self.0[4],
            self.0[5],
        ])
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.0.map(f64::from);
        (a[0] * x + a[2] * y + a[4], a[1] * x + a[3] * y + a[5])
    }

    pub fn origin(&self) -> (f64, f64) {
        (f64::from(self.0[4]), f64::from(self.0[5]))
    }

    pub fn to_svg(&self) -> String {
        let a = self.0.map(f64::from);
        format!(
            "matrix({} {} {} {} {} {})",
            num(a[0]),
            num(a[1]),
            num(a[2]),
            num(a[3]),
            num(a[4]),
            num(a[5])
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}
