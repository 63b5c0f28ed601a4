//! Named color palettes for heatmap rendering.
//!
//! The fixed palette set mirrors the choices the correlation view offers:
//! coolwarm, viridis, plasma, inferno, magma, cividis. Each is a small set
//! of RGB anchor stops interpolated linearly; an unknown name falls back to
//! coolwarm so palette lookup is total.

use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    name: &'static str,
    stops: &'static [(f64, (u8, u8, u8))],
}

const COOLWARM: Colormap = Colormap {
    name: "coolwarm",
    stops: &[
        (0.0, (59, 76, 192)),
        (0.5, (221, 221, 221)),
        (1.0, (180, 4, 38)),
    ],
};

const VIRIDIS: Colormap = Colormap {
    name: "viridis",
    stops: &[
        (0.0, (68, 1, 84)),
        (0.2, (65, 68, 135)),
        (0.4, (42, 120, 142)),
        (0.6, (34, 168, 132)),
        (0.8, (122, 209, 81)),
        (1.0, (253, 231, 37)),
    ],
};

const PLASMA: Colormap = Colormap {
    name: "plasma",
    stops: &[
        (0.0, (13, 8, 135)),
        (0.2, (106, 0, 168)),
        (0.4, (177, 42, 144)),
        (0.6, (225, 100, 98)),
        (0.8, (252, 166, 54)),
        (1.0, (240, 249, 33)),
    ],
};

const INFERNO: Colormap = Colormap {
    name: "inferno",
    stops: &[
        (0.0, (0, 0, 4)),
        (0.2, (66, 10, 104)),
        (0.4, (147, 38, 103)),
        (0.6, (221, 81, 58)),
        (0.8, (252, 165, 10)),
        (1.0, (252, 255, 164)),
    ],
};

const MAGMA: Colormap = Colormap {
    name: "magma",
    stops: &[
        (0.0, (0, 0, 4)),
        (0.2, (59, 15, 112)),
        (0.4, (140, 41, 129)),
        (0.6, (222, 73, 104)),
        (0.8, (254, 159, 109)),
        (1.0, (252, 253, 191)),
    ],
};

const CIVIDIS: Colormap = Colormap {
    name: "cividis",
    stops: &[
        (0.0, (0, 34, 78)),
        (0.2, (53, 69, 108)),
        (0.4, (102, 105, 112)),
        (0.6, (148, 142, 119)),
        (0.8, (200, 184, 102)),
        (1.0, (254, 232, 56)),
    ],
};

const ALL: &[Colormap] = &[COOLWARM, VIRIDIS, PLASMA, INFERNO, MAGMA, CIVIDIS];

impl Colormap {
    /// Look up a palette by name, case-insensitive. Unknown names fall back
    /// to coolwarm.
    pub fn by_name(name: &str) -> Colormap {
        ALL.iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .copied()
            .unwrap_or(COOLWARM)
    }

    pub fn names() -> Vec<&'static str> {
        ALL.iter().map(|c| c.name).collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sample the ramp at t in [0, 1] (clamped).
    pub fn sample(&self, t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        let mut lower = self.stops[0];
        for &stop in self.stops {
            if stop.0 <= t {
                lower = stop;
            } else {
                let (t0, (r0, g0, b0)) = lower;
                let (t1, (r1, g1, b1)) = stop;
                let span = (t1 - t0).max(f64::EPSILON);
                let frac = (t - t0) / span;
                let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
                return RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1));
            }
        }
        let (_, (r, g, b)) = lower;
        RGBColor(r, g, b)
    }

    /// Relative luminance of the sampled color; used to pick a readable
    /// annotation color on top of a cell.
    pub fn luminance(&self, t: f64) -> f64 {
        let RGBColor(r, g, b) = self.sample(t);
        (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
    }
}
