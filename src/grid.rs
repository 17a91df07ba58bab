// Copyright (c) 2026 glowveil contributors

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    Rng, SeedableRng,
};

use crate::canvas::Canvas;
use crate::scene::Scene;

#[derive(Clone, Copy, Debug)]
pub struct GridParams {
    /// Lattice spacing in logical units.
    pub spacing_x: f32,
    pub spacing_y: f32,
    /// Brightness of the static base lattice.
    pub base_alpha: f32,
    /// Peak brightness of an excited cell's border glow.
    pub max_glow_alpha: f32,
    /// Stroke footprint of the glow edges.
    pub glow_radius: f32,
    /// Front travel speed range, units per second. Redrawn on each
    /// edge reflection.
    pub front_speed_min: f32,
    pub front_speed_max: f32,
    /// Width of the excitation band, in cells.
    pub front_width_cells: f32,
    /// Poisson excitation rate at the center of the front.
    pub on_rate: f32,
    /// Exponential activation decay rate.
    pub decay: f32,
    /// Activation bump on an excitation event, randomized within
    /// [0.8, 1.2] of this.
    pub jump: f32,
    /// Amplitude of the symmetric per-tick flicker noise.
    pub flicker_amp: f32,
    /// Visibility cutoff; also decides on/off for the pointer toggle.
    pub threshold: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            spacing_x: 16.0,
            spacing_y: 16.0,
            base_alpha: 0.16,
            max_glow_alpha: 0.9,
            glow_radius: 1.1,
            front_speed_min: 18.0,
            front_speed_max: 40.0,
            front_width_cells: 2.0,
            on_rate: 3.0,
            decay: 1.1,
            jump: 0.45,
            flicker_amp: 0.02,
            threshold: 0.05,
        }
    }
}

/// The traveling wave source. One per engine; reflects at the viewport
/// edges with a freshly randomized speed.
#[derive(Clone, Copy, Debug)]
pub struct Front {
    pub pos: f32,
    pub dir: f32,
    pub speed: f32,
}

pub struct GridField {
    params: GridParams,
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    /// Row-major activation values, each in [0, 1].
    cells: Vec<f32>,
    front: Front,
    base: Canvas,
    /// Cell under the pointer, tracked so a toggle fires only on entry.
    hover_cell: Option<(usize, usize)>,
    rng: StdRng,
    rand_unit: Uniform<f32>,
}

impl GridField {
    pub fn new(params: GridParams, width: f32, height: f32, seed: u64) -> Self {
        let mut field = Self {
            params,
            width: 1.0,
            height: 1.0,
            cols: 1,
            rows: 1,
            cells: Vec::new(),
            front: Front {
                pos: 0.0,
                dir: 1.0,
                speed: params.front_speed_min,
            },
            base: Canvas::new(1, 1),
            hover_cell: None,
            rng: StdRng::seed_from_u64(seed),
            rand_unit: Uniform::new(0.0f32, 1.0).expect("valid range"),
        };
        field.rebuild(width, height);
        field
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn front(&self) -> Front {
        self.front
    }

    pub fn activation(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.cols + col]
    }

    #[cfg(test)]
    fn set_activation(&mut self, row: usize, col: usize, v: f32) {
        let cols = self.cols;
        self.cells[row * cols + col] = v;
    }

    fn rebuild(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.cols = ((self.width / self.params.spacing_x).ceil() as usize).max(1);
        self.rows = ((self.height / self.params.spacing_y).ceil() as usize).max(1);
        self.cells.clear();
        self.cells.resize(self.cols * self.rows, 0.0);
        self.hover_cell = None;
        self.base = self.make_base_lattice();

        self.front = Front {
            pos: self.rand_unit.sample(&mut self.rng) * self.width,
            dir: if self.rng.random_bool(0.5) { -1.0 } else { 1.0 },
            speed: self.random_front_speed(),
        };
    }

    /// The static lattice, drawn once per rebuild and blitted under the
    /// glow strokes every frame.
    fn make_base_lattice(&self) -> Canvas {
        let mut base = Canvas::new(self.width as usize, self.height as usize);
        let amp = self.params.base_alpha;
        let mut x = 0.0;
        while x <= self.width {
            base.line(x, 0.0, x, self.height, amp, 0.6);
            x += self.params.spacing_x;
        }
        let mut y = 0.0;
        while y <= self.height {
            base.line(0.0, y, self.width, y, amp, 0.6);
            y += self.params.spacing_y;
        }
        base
    }

    fn random_front_speed(&mut self) -> f32 {
        let t = self.rand_unit.sample(&mut self.rng);
        self.params.front_speed_min + (self.params.front_speed_max - self.params.front_speed_min) * t
    }

    fn advance_front(&mut self, dt: f32) {
        self.front.pos += self.front.dir * self.front.speed * dt;
        if self.front.pos < 0.0 {
            self.front.pos = 0.0;
            self.front.dir = 1.0;
            self.front.speed = self.random_front_speed();
        }
        if self.front.pos > self.width {
            self.front.pos = self.width;
            self.front.dir = -1.0;
            self.front.speed = self.random_front_speed();
        }
    }

    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 || x >= self.width || y >= self.height {
            return None;
        }
        let col = (x / self.params.spacing_x).floor() as usize;
        let row = (y / self.params.spacing_y).floor() as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some((row, col))
    }
}

impl Scene for GridField {
    fn resize(&mut self, width: f32, height: f32) {
        self.rebuild(width, height);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        let Some(hit) = self.cell_at(x, y) else {
            self.hover_cell = None;
            return;
        };
        if self.hover_cell == Some(hit) {
            return;
        }
        self.hover_cell = Some(hit);

        // Toggle reads on/off from the visibility threshold rather than
        // a stored boolean; a cell flickering above threshold therefore
        // toggles to dark. Intentional, see DESIGN.md.
        let idx = hit.0 * self.cols + hit.1;
        let is_on = self.cells[idx] >= self.params.threshold;
        self.cells[idx] = if is_on { 0.0 } else { 1.0 };
    }

    fn pointer_left(&mut self) {
        self.hover_cell = None;
    }

    fn update(&mut self, dt: f32) {
        self.advance_front(dt);

        let sigma = self.params.front_width_cells * self.params.spacing_x * 0.5;
        let inv_2s2 = 1.0 / (2.0 * sigma * sigma + 1e-6);
        let decay = (-self.params.decay * dt).exp();

        for col in 0..self.cols {
            let x_center = (col as f32 + 0.5) * self.params.spacing_x;
            let dx = x_center - self.front.pos;
            let gauss = (-(dx * dx) * inv_2s2).exp();
            let p_on = 1.0 - (-self.params.on_rate * gauss * dt).exp();

            for row in 0..self.rows {
                let idx = row * self.cols + col;
                let mut a = self.cells[idx];

                if self.rand_unit.sample(&mut self.rng) < p_on {
                    let jump = self.params.jump * (0.8 + 0.4 * self.rand_unit.sample(&mut self.rng));
                    a = (a + jump).min(1.0);
                }

                a *= decay;

                if self.params.flicker_amp > 0.0 {
                    a += (self.rand_unit.sample(&mut self.rng) - 0.5) * self.params.flicker_amp;
                }

                self.cells[idx] = a.clamp(0.0, 1.0);
            }
        }
    }

    fn render(&self, canvas: &mut Canvas) {
        canvas.add_from(&self.base);

        let p = &self.params;
        for row in 0..self.rows {
            let y0 = row as f32 * p.spacing_y;
            let y1 = ((row + 1) as f32 * p.spacing_y).min(self.height);
            for col in 0..self.cols {
                let a = self.cells[row * self.cols + col];
                if a < p.threshold {
                    continue;
                }
                let amp = a * p.max_glow_alpha;
                let x0 = col as f32 * p.spacing_x;
                let x1 = ((col + 1) as f32 * p.spacing_x).min(self.width);

                canvas.line(x0, y0, x1, y0, amp, p.glow_radius);
                canvas.line(x0, y1, x1, y1, amp, p.glow_radius);
                canvas.line(x0, y0, x0, y1, amp, p.glow_radius);
                canvas.line(x1, y0, x1, y1, amp, p.glow_radius);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(spacing: f32, w: f32, h: f32) -> GridField {
        let params = GridParams {
            spacing_x: spacing,
            spacing_y: spacing,
            ..GridParams::default()
        };
        GridField::new(params, w, h, 7)
    }

    #[test]
    fn grid_dimensions_follow_spacing() {
        let f = field(72.0, 720.0, 720.0);
        assert_eq!(f.cols(), 10);
        assert_eq!(f.rows(), 10);
        for row in 0..f.rows() {
            for col in 0..f.cols() {
                assert_eq!(f.activation(row, col), 0.0);
            }
        }
    }

    #[test]
    fn activations_stay_bounded_over_long_runs() {
        let mut f = field(72.0, 720.0, 720.0);
        for _ in 0..1000 {
            f.update(0.016);
            for row in 0..f.rows() {
                for col in 0..f.cols() {
                    let a = f.activation(row, col);
                    assert!(a <= 1.000_001, "activation {} above bound", a);
                    assert!(a >= -0.000_001, "activation {} below bound", a);
                }
            }
        }
    }

    #[test]
    fn excitation_actually_lights_cells() {
        let mut f = field(16.0, 160.0, 96.0);
        let mut any_lit = false;
        for _ in 0..600 {
            f.update(0.016);
            if (0..f.rows()).any(|r| (0..f.cols()).any(|c| f.activation(r, c) > 0.2)) {
                any_lit = true;
                break;
            }
        }
        assert!(any_lit);
    }

    #[test]
    fn front_reflects_at_edges_and_stays_inside() {
        let mut f = field(16.0, 160.0, 96.0);
        let mut flips = 0;
        let mut last_dir = f.front().dir;
        for _ in 0..5000 {
            f.update(0.05);
            let front = f.front();
            assert!(front.pos >= 0.0 && front.pos <= 160.0);
            assert!(front.speed >= f.params.front_speed_min);
            assert!(front.speed <= f.params.front_speed_max);
            if front.dir != last_dir {
                flips += 1;
                assert!(front.pos == 0.0 || front.pos == 160.0);
                last_dir = front.dir;
            }
        }
        assert!(flips >= 2, "front never reflected");
    }

    #[test]
    fn pointer_toggles_on_cell_entry_only() {
        let mut f = field(16.0, 160.0, 96.0);
        // Dim cell lights up on entry.
        f.pointer_moved(8.0, 8.0);
        assert_eq!(f.activation(0, 0), 1.0);
        // Wiggling inside the same cell does not toggle again.
        f.pointer_moved(9.0, 9.0);
        assert_eq!(f.activation(0, 0), 1.0);
        // Entering a neighbor toggles that one; coming back toggles off.
        f.pointer_moved(24.0, 8.0);
        assert_eq!(f.activation(0, 1), 1.0);
        f.pointer_moved(8.0, 8.0);
        assert_eq!(f.activation(0, 0), 0.0);
    }

    #[test]
    fn leaving_clears_the_tracked_cell() {
        let mut f = field(16.0, 160.0, 96.0);
        f.pointer_moved(8.0, 8.0);
        assert_eq!(f.activation(0, 0), 1.0);
        f.pointer_left();
        f.pointer_moved(8.0, 8.0);
        assert_eq!(f.activation(0, 0), 0.0);
    }

    #[test]
    fn toggle_treats_flicker_above_threshold_as_on() {
        let mut f = field(16.0, 160.0, 96.0);
        f.set_activation(0, 0, 0.06);
        f.pointer_moved(8.0, 8.0);
        assert_eq!(f.activation(0, 0), 0.0);
    }

    #[test]
    fn out_of_bounds_pointer_does_not_toggle() {
        let mut f = field(16.0, 160.0, 96.0);
        f.pointer_moved(-5.0, 8.0);
        f.pointer_moved(500.0, 8.0);
        assert_eq!(f.activation(0, 0), 0.0);
    }

    #[test]
    fn resize_rebuilds_grid_and_resets_activation() {
        let mut f = field(16.0, 160.0, 96.0);
        for _ in 0..50 {
            f.update(0.016);
        }
        f.resize(320.0, 200.0);
        assert_eq!(f.cols(), 20);
        assert_eq!(f.rows(), (200.0f32 / 16.0).ceil() as usize);
        for row in 0..f.rows() {
            for col in 0..f.cols() {
                assert_eq!(f.activation(row, col), 0.0);
            }
        }
    }

    #[test]
    fn render_is_additive_over_the_base_lattice() {
        let mut f = field(16.0, 64.0, 64.0);
        let mut empty = Canvas::new(64, 64);
        f.render(&mut empty);
        let base_total: f32 = empty.intensity().iter().sum();
        assert!(base_total > 0.0, "base lattice missing");

        f.set_activation(1, 1, 1.0);
        let mut lit = Canvas::new(64, 64);
        f.render(&mut lit);
        let lit_total: f32 = lit.intensity().iter().sum();
        assert!(lit_total > base_total);
    }
}
