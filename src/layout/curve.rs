//! Path-data builders shared by trees, flowers and swarm connectors.

use crate::scene::num;
use std::f64::consts::PI;

const EPSILON: f64 = 1e-12;
const ALPHA: f64 = 0.5;

/// Rounds to three decimals the way line generators emit coordinates.
fn round3(value: f64) -> f64 {
    (value * 1000.0 + 0.5).floor() / 1000.0
}

#[derive(Default)]
struct PathWriter {
    d: String,
}

impl PathWriter {
    fn move_to(&mut self, x: f64, y: f64) {
        self.d
            .push_str(&format!("M{},{}", num(round3(x)), num(round3(y))));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.d
            .push_str(&format!("L{},{}", num(round3(x)), num(round3(y))));
    }

    fn curve_to(&mut self, c1: (f64, f64), c2: (f64, f64), end: (f64, f64)) {
        self.d.push_str(&format!(
            "C{},{},{},{},{},{}",
            num(round3(c1.0)),
            num(round3(c1.1)),
            num(round3(c2.0)),
            num(round3(c2.1)),
            num(round3(end.0)),
            num(round3(end.1))
        ));
    }

    fn close(&mut self) {
        self.d.push('Z');
    }
}

/// Centripetal Catmull-Rom spline (alpha 0.5) through `points`, as cubic Bézier path data.
///
/// The first and last segments use the end points as phantom neighbours. A single point yields a
/// closed move (`M x,y Z`), two points a straight line.
pub fn catmull_rom(points: &[(f64, f64)]) -> String {
    let mut state = CatmullRom::default();
    for &(x, y) in points {
        state.point(x, y);
    }
    state.line_end();
    state.out.d
}

#[derive(Default)]
struct CatmullRom {
    out: PathWriter,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    l01_a: f64,
    l12_a: f64,
    l23_a: f64,
    l01_2a: f64,
    l12_2a: f64,
    l23_2a: f64,
    count: u8,
}

impl CatmullRom {
    fn point(&mut self, x: f64, y: f64) {
        if self.count > 0 {
            let x23 = self.x2 - x;
            let y23 = self.y2 - y;
            self.l23_2a = (x23 * x23 + y23 * y23).powf(ALPHA);
            self.l23_a = self.l23_2a.sqrt();
        }

        match self.count {
            0 => {
                self.count = 1;
                self.out.move_to(x, y);
            }
            1 => self.count = 2,
            2 => {
                self.count = 3;
                self.bezier(x, y);
            }
            _ => self.bezier(x, y),
        }

        self.l01_a = self.l12_a;
        self.l12_a = self.l23_a;
        self.l01_2a = self.l12_2a;
        self.l12_2a = self.l23_2a;
        self.x0 = self.x1;
        self.x1 = self.x2;
        self.x2 = x;
        self.y0 = self.y1;
        self.y1 = self.y2;
        self.y2 = y;
    }

    fn bezier(&mut self, x: f64, y: f64) {
        let (mut cx1, mut cy1) = (self.x1, self.y1);
        let (mut cx2, mut cy2) = (self.x2, self.y2);

        if self.l01_a > EPSILON {
            let a = 2.0 * self.l01_2a + 3.0 * self.l01_a * self.l12_a + self.l12_2a;
            let n = 3.0 * self.l01_a * (self.l01_a + self.l12_a);
            cx1 = (cx1 * a - self.x0 * self.l12_2a + self.x2 * self.l01_2a) / n;
            cy1 = (cy1 * a - self.y0 * self.l12_2a + self.y2 * self.l01_2a) / n;
        }

        if self.l23_a > EPSILON {
            let b = 2.0 * self.l23_2a + 3.0 * self.l23_a * self.l12_a + self.l12_2a;
            let m = 3.0 * self.l23_a * (self.l23_a + self.l12_a);
            cx2 = (cx2 * b + self.x1 * self.l23_2a - x * self.l12_2a) / m;
            cy2 = (cy2 * b + self.y1 * self.l23_2a - y * self.l12_2a) / m;
        }

        self.out
            .curve_to((cx1, cy1), (cx2, cy2), (self.x2, self.y2));
    }

    fn line_end(&mut self) {
        match self.count {
            2 => self.out.line_to(self.x2, self.y2),
            3 => {
                let (x, y) = (self.x2, self.y2);
                self.point(x, y);
            }
            _ => {}
        }
        if self.count == 1 {
            self.out.close();
        }
    }
}

/// Straight polyline path data.
pub fn linear(points: &[(f64, f64)]) -> String {
    let mut out = PathWriter::default();
    for (idx, &(x, y)) in points.iter().enumerate() {
        if idx == 0 {
            out.move_to(x, y);
        } else {
            out.line_to(x, y);
        }
    }
    out.d
}

/// Full circle of radius `r` around the origin as two arcs.
pub fn circle(r: f64) -> String {
    if !(r > 0.0) {
        return String::new();
    }
    let r = num(r);
    format!("M{r},0A{r},{r},0,1,1,-{r},0A{r},{r},0,1,1,{r},0")
}

/// Parallel fill strokes clipped to a circle of radius `r`, `gap` apart, at `angle_deg`.
pub fn hachure_circle(r: f64, gap: f64, angle_deg: f64) -> String {
    if !(r > 0.0) || !(gap > 0.0) {
        return String::new();
    }
    let angle = angle_deg * PI / 180.0;
    let (ux, uy) = (angle.cos(), angle.sin());
    let (vx, vy) = (-uy, ux);
    let mut d = String::new();
    let mut offset = -r + gap;
    while offset < r {
        let half = (r * r - offset * offset).max(0.0).sqrt();
        let (cx, cy) = (vx * offset, vy * offset);
        d.push_str(&format!(
            "M{:.2},{:.2}L{:.2},{:.2}",
            cx - ux * half,
            cy - uy * half,
            cx + ux * half,
            cy + uy * half
        ));
        offset += gap;
    }
    d
}
