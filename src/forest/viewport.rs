use super::Extent;
use crate::scene::num;
use serde::Serialize;
use std::f64::consts::SQRT_2;

const RHO: f64 = SQRT_2;
const RHO2: f64 = 2.0;
const RHO4: f64 = 4.0;
const EPSILON2: f64 = 1e-12;

/// A square view window: centre and visible side length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Viewport {
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self { x, y, size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Path {
    /// An end has no size; there is nothing to fly through.
    Jump,
    /// Same centre: only the scale changes.
    Scale { s: f64 },
    Fly { d1: f64, r0: f64, s: f64 },
}

/// Smooth zoom path between two viewports (van Wijk and Nuij).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomInterpolator {
    start: Viewport,
    end: Viewport,
    path: Path,
    /// Natural length of the path in milliseconds; negative when zooming out in place.
    pub duration: f64,
}

pub fn interpolate_zoom(start: Viewport, end: Viewport) -> ZoomInterpolator {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let d2 = dx * dx + dy * dy;
    let (w0, w1) = (start.size, end.size);
    let path = if !(w0 > 0.0 && w1 > 0.0) {
        Path::Jump
    } else if d2 < EPSILON2 {
        Path::Scale {
            s: (w1 / w0).ln() / RHO,
        }
    } else {
        let d1 = d2.sqrt();
        let b0 = (w1 * w1 - w0 * w0 + RHO4 * d2) / (2.0 * w0 * RHO2 * d1);
        let b1 = (w1 * w1 - w0 * w0 - RHO4 * d2) / (2.0 * w1 * RHO2 * d1);
        let r0 = ((b0 * b0 + 1.0).sqrt() - b0).ln();
        let r1 = ((b1 * b1 + 1.0).sqrt() - b1).ln();
        Path::Fly {
            d1,
            r0,
            s: (r1 - r0) / RHO,
        }
    };
    let s = match path {
        Path::Jump => 0.0,
        Path::Scale { s } | Path::Fly { s, .. } => s,
    };
    ZoomInterpolator {
        start,
        end,
        path,
        duration: s * 1000.0 * RHO / SQRT_2,
    }
}

impl ZoomInterpolator {
    pub fn at(&self, t: f64) -> Viewport {
        let Viewport { x: ux0, y: uy0, size: w0 } = self.start;
        let dx = self.end.x - ux0;
        let dy = self.end.y - uy0;
        match self.path {
            Path::Jump => self.end,
            Path::Scale { s } => Viewport::new(ux0 + t * dx, uy0 + t * dy, w0 * (RHO * t * s).exp()),
            Path::Fly { d1, r0, s } => {
                let s = t * s;
                let cosh_r0 = r0.cosh();
                let u = w0 / (RHO2 * d1) * (cosh_r0 * (RHO * s + r0).tanh() - r0.sinh());
                Viewport::new(ux0 + u * dx, uy0 + u * dy, w0 * cosh_r0 / (RHO * s + r0).cosh())
            }
        }
    }

    pub fn end(&self) -> Viewport {
        self.end
    }
}

/// `translate(tx, ty) scale(k)` applied to the forest group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub tx: f64,
    pub ty: f64,
    pub k: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        tx: 0.0,
        ty: 0.0,
        k: 1.0,
    };

    pub fn to_svg(&self) -> String {
        format!("translate({}, {}) scale({})", num(self.tx), num(self.ty), num(self.k))
    }

    fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.k, (y - self.ty) / self.k)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewState {
    Overview,
    Focused(usize),
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    target: ViewState,
    interpolator: ZoomInterpolator,
    started_ms: f64,
    duration_ms: f64,
}

/// Overview/focus navigation over a placed forest.
///
/// A click starts a transition unless one is already running; clicks during a transition are
/// dropped. Clicking the focused cell again flies back to the overview.
#[derive(Debug, Clone)]
pub struct ZoomController {
    extent: Extent,
    cell_size: f64,
    duration_multiplier: f64,
    state: ViewState,
    transform: ViewTransform,
    transition: Option<Transition>,
}

impl ZoomController {
    pub fn new(extent: Extent, cell_size: f64, duration_multiplier: f64) -> Self {
        Self {
            extent,
            cell_size,
            duration_multiplier,
            state: ViewState::Overview,
            transform: ViewTransform::IDENTITY,
            transition: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn is_zooming(&self) -> bool {
        self.transition.is_some()
    }

    pub fn overview(&self) -> Viewport {
        let (x, y) = self.extent.center();
        Viewport::new(x, y, self.extent.size())
    }

    /// Transform that shows `viewport` in the overview's frame.
    pub fn view_transform(&self, viewport: Viewport) -> ViewTransform {
        let size = self.extent.size();
        if !(size > 0.0 && viewport.size > 0.0) {
            return ViewTransform::IDENTITY;
        }
        let (cx, cy) = self.extent.center();
        let k = size / viewport.size;
        ViewTransform {
            tx: cx - viewport.x * k,
            ty: cy - viewport.y * k,
            k,
        }
    }

    /// Viewport currently shown, derived from the live transform.
    pub fn current_viewport(&self) -> Viewport {
        let (cx, cy) = self.extent.center();
        let ViewTransform { tx, ty, k } = self.transform;
        Viewport::new((cx - tx) / k, (cy - ty) / k, self.extent.size() / k)
    }

    /// Starts a transition towards cell `index` centred at `(x, y)`. Returns whether one began.
    pub fn click(&mut self, index: usize, x: f64, y: f64, now_ms: f64) -> bool {
        if self.is_zooming() {
            tracing::debug!(index, "zoom in flight, click ignored");
            return false;
        }
        let (target, end) = if self.state == ViewState::Focused(index) {
            (ViewState::Overview, self.overview())
        } else {
            (ViewState::Focused(index), Viewport::new(x, y, self.cell_size))
        };
        let interpolator = interpolate_zoom(self.current_viewport(), end);
        let duration_ms = interpolator.duration.abs() * self.duration_multiplier;
        tracing::debug!(?target, duration_ms, "zoom started");
        self.transition = Some(Transition {
            target,
            interpolator,
            started_ms: now_ms,
            duration_ms,
        });
        true
    }

    /// Advances a running transition to `now_ms`, committing it once complete.
    pub fn tick(&mut self, now_ms: f64) -> Option<ViewTransform> {
        let transition = self.transition?;
        let t = if transition.duration_ms > 0.0 {
            ((now_ms - transition.started_ms) / transition.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            self.finish();
        } else {
            self.transform = self.view_transform(transition.interpolator.at(t));
        }
        Some(self.transform)
    }

    /// Jumps a running transition to its end and releases the latch.
    pub fn finish(&mut self) {
        if let Some(transition) = self.transition.take() {
            self.transform = self.view_transform(transition.interpolator.end());
            self.state = transition.target;
        }
    }

    fn scale_extent(&self) -> (f64, f64) {
        let max = if self.cell_size > 0.0 {
            self.extent.size() / self.cell_size
        } else {
            1.0
        };
        (1.0, max.max(1.0))
    }

    /// Keeps the visible window inside the forest bounds.
    fn constrain(&self, transform: ViewTransform) -> ViewTransform {
        let e = &self.extent;
        let (x0, y0) = transform.invert(e.min_x, e.min_y);
        let (x1, y1) = transform.invert(e.max_x, e.max_y);
        let shift = |d0: f64, d1: f64| {
            if d1 > d0 {
                (d0 + d1) / 2.0
            } else {
                let low = d0.min(0.0);
                if low != 0.0 { low } else { d1.max(0.0) }
            }
        };
        let sx = shift(x0 - e.min_x, x1 - e.max_x);
        let sy = shift(y0 - e.min_y, y1 - e.max_y);
        ViewTransform {
            tx: transform.tx + transform.k * sx,
            ty: transform.ty + transform.k * sy,
            k: transform.k,
        }
    }

    /// Moves the view by `(dx, dy)` in forest units. Ignored while zooming.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if self.is_zooming() {
            return false;
        }
        let moved = ViewTransform {
            tx: self.transform.tx + dx,
            ty: self.transform.ty + dy,
            ..self.transform
        };
        self.transform = self.constrain(moved);
        true
    }

    /// Scales the view about the forest centre. Ignored while zooming.
    pub fn zoom(&mut self, factor: f64) -> bool {
        if self.is_zooming() || !(factor > 0.0) {
            return false;
        }
        let (min, max) = self.scale_extent();
        let k = (self.transform.k * factor).max(min).min(max);
        let (cx, cy) = self.extent.center();
        let (px, py) = self.transform.invert(cx, cy);
        let scaled = ViewTransform {
            tx: cx - px * k,
            ty: cy - py * k,
            k,
        };
        self.transform = self.constrain(scaled);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest_extent() -> Extent {
        Extent {
            min_x: -240.0,
            min_y: -240.0,
            max_x: 1200.0,
            max_y: 720.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn interpolation_hits_both_ends() {
        let start = Viewport::new(0.0, 0.0, 960.0);
        let end = Viewport::new(480.0, 240.0, 480.0);
        let zoom = interpolate_zoom(start, end);
        let first = zoom.at(0.0);
        let last = zoom.at(1.0);
        assert!(close(first.x, 0.0) && close(first.y, 0.0) && close(first.size, 960.0));
        assert!(close(last.x, 480.0) && close(last.y, 240.0) && close(last.size, 480.0));
        assert!(zoom.duration > 0.0);
    }

    #[test]
    fn zooming_out_in_place_has_negative_natural_duration() {
        let zoom = interpolate_zoom(Viewport::new(5.0, 5.0, 480.0), Viewport::new(5.0, 5.0, 960.0));
        // S = ln(2) / sqrt(2); duration = S * 1000
        assert!(close(zoom.duration, 2f64.ln() / SQRT_2 * 1000.0));
        let back = interpolate_zoom(Viewport::new(5.0, 5.0, 960.0), Viewport::new(5.0, 5.0, 480.0));
        assert!(back.duration < 0.0);
        assert!(close(back.at(1.0).size, 480.0));
    }

    #[test]
    fn overview_transform_is_identity() {
        let controller = ZoomController::new(forest_extent(), 480.0, 1.2);
        let transform = controller.view_transform(controller.overview());
        assert_eq!(transform, ViewTransform::IDENTITY);
        assert_eq!(transform.to_svg(), "translate(0, 0) scale(1)");
    }

    #[test]
    fn click_focuses_then_toggles_back() {
        let mut controller = ZoomController::new(forest_extent(), 480.0, 1.2);
        assert!(controller.click(2, 960.0, 480.0, 0.0));
        assert!(controller.is_zooming());
        // latched while in flight
        assert!(!controller.click(0, 0.0, 0.0, 10.0));
        assert!(!controller.pan(10.0, 0.0));

        let mid = controller.tick(1.0).unwrap();
        assert_ne!(mid, ViewTransform::IDENTITY);
        assert_eq!(controller.state(), ViewState::Overview);
        controller.finish();
        assert_eq!(controller.state(), ViewState::Focused(2));
        let focused = controller.transform();
        assert!(close(focused.k, 2.0));
        let view = controller.current_viewport();
        assert!(close(view.x, 960.0) && close(view.y, 480.0) && close(view.size, 480.0));

        assert!(controller.click(2, 960.0, 480.0, 100.0));
        let transform = controller.tick(1e9).unwrap();
        assert_eq!(controller.state(), ViewState::Overview);
        assert!(!controller.is_zooming());
        assert!(close(transform.k, 1.0) && close(transform.tx, 0.0) && close(transform.ty, 0.0));
    }

    #[test]
    fn clicking_another_cell_moves_focus() {
        let mut controller = ZoomController::new(forest_extent(), 480.0, 1.2);
        controller.click(0, 0.0, 0.0, 0.0);
        controller.finish();
        controller.click(1, 480.0, 0.0, 0.0);
        controller.finish();
        assert_eq!(controller.state(), ViewState::Focused(1));
    }

    #[test]
    fn duration_scales_with_multiplier() {
        let mut controller = ZoomController::new(forest_extent(), 480.0, 1.2);
        let natural = interpolate_zoom(controller.overview(), Viewport::new(0.0, 0.0, 480.0));
        controller.click(0, 0.0, 0.0, 0.0);
        let halfway = natural.duration.abs() * 1.2 / 2.0;
        let transform = controller.tick(halfway).unwrap();
        assert!(controller.is_zooming());
        assert_eq!(transform, controller.view_transform(natural.at(0.5)));
    }

    #[test]
    fn pan_and_zoom_stay_in_bounds() {
        let mut controller = ZoomController::new(forest_extent(), 480.0, 1.2);
        assert!(controller.pan(100.0, 0.0));
        assert_eq!(controller.transform(), ViewTransform::IDENTITY);

        assert!(controller.zoom(10.0));
        assert!(close(controller.transform().k, 2.0));
        assert!(controller.zoom(0.01));
        assert!(close(controller.transform().k, 1.0));

        controller.zoom(2.0);
        controller.pan(-10_000.0, 0.0);
        let view = controller.current_viewport();
        assert!(view.x + view.size / 2.0 <= 1200.0 + 1e-9);
    }

    #[test]
    fn empty_forest_does_not_panic() {
        let empty = Extent {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };
        let mut controller = ZoomController::new(empty, 480.0, 1.2);
        assert!(controller.zoom(2.0));
        assert!(controller.pan(5.0, 5.0));

        assert!(controller.click(0, 0.0, 0.0, 0.0));
        assert_eq!(controller.tick(0.0), Some(ViewTransform::IDENTITY));
        assert_eq!(controller.state(), ViewState::Focused(0));
    }

    #[test]
    fn zero_width_ends_jump_without_nan() {
        let zoom = interpolate_zoom(Viewport::new(0.0, 0.0, 0.0), Viewport::new(100.0, 50.0, 480.0));
        assert_eq!(zoom.duration, 0.0);
        assert_eq!(zoom.at(0.5), Viewport::new(100.0, 50.0, 480.0));

        let zoom = interpolate_zoom(Viewport::new(100.0, 50.0, 480.0), Viewport::new(0.0, 0.0, 0.0));
        assert_eq!(zoom.duration, 0.0);
        assert!(!zoom.at(0.3).size.is_nan());
    }

    #[test]
    fn single_cell_overview_is_the_focus_view() {
        let one = Extent {
            min_x: -240.0,
            min_y: -240.0,
            max_x: 240.0,
            max_y: 240.0,
        };
        let mut controller = ZoomController::new(one, 480.0, 1.2);
        let overview = controller.overview();
        let focus = Viewport::new(0.0, 0.0, 480.0);
        assert_eq!(overview, focus);

        let zoom = interpolate_zoom(overview, focus);
        assert_eq!(zoom.duration, 0.0);
        assert_eq!(zoom.at(0.5), focus);

        assert!(controller.click(0, 0.0, 0.0, 0.0));
        let transform = controller.tick(0.0).unwrap();
        assert!(!transform.k.is_nan() && !transform.tx.is_nan() && !transform.ty.is_nan());
        assert_eq!(transform, ViewTransform::IDENTITY);
        assert_eq!(controller.state(), ViewState::Focused(0));
        assert!(!controller.is_zooming());
    }
}
