//! Fractal type registry and named constants.
//!
//! Static descriptions shared by the request layer (type listing, defaults)
//! and the compute layer.

use crate::{Complex, FractalKind, FractalParameters};

/// Configuration for a fractal type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalConfig {
    pub kind: FractalKind,
    /// Human-readable name for display
    pub display_name: &'static str,
    pub description: &'static str,
    /// Default viewport as (x_min, x_max, y_min, y_max)
    pub default_bounds: (f64, f64, f64, f64),
    /// Whether smooth (continuous) escape values are meaningful for this type
    pub supports_smooth: bool,
}

impl FractalConfig {
    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    /// Default request parameters for this fractal.
    pub fn default_parameters(&self) -> FractalParameters {
        let (x_min, x_max, y_min, y_max) = self.default_bounds;
        let params = FractalParameters::defaults().with_bounds(x_min, x_max, y_min, y_max);
        match self.kind {
            FractalKind::Mandelbrot => params,
            FractalKind::Julia => params.with_julia(DRAGON.c),
        }
    }
}

pub static MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    kind: FractalKind::Mandelbrot,
    display_name: "Mandelbrot Set",
    description: "Divergence of z(n+1) = z(n)^2 + c from z(0) = 0 for each pixel c",
    default_bounds: (-2.5, 1.0, -1.25, 1.25),
    supports_smooth: true,
};

pub static JULIA_CONFIG: FractalConfig = FractalConfig {
    kind: FractalKind::Julia,
    display_name: "Julia Set",
    description: "Divergence of z(n+1) = z(n)^2 + c for a fixed c, starting at each pixel z(0)",
    default_bounds: (-2.0, 2.0, -2.0, 2.0),
    supports_smooth: true,
};

pub static FRACTAL_CONFIGS: &[&FractalConfig] = &[&MANDELBROT_CONFIG, &JULIA_CONFIG];

/// Look up a fractal configuration by id (case-insensitive).
pub fn get_fractal_config(id: &str) -> Option<&'static FractalConfig> {
    FRACTAL_CONFIGS
        .iter()
        .copied()
        .find(|config| config.id().eq_ignore_ascii_case(id))
}

/// Configuration for a parsed fractal kind.
pub fn fractal_config(kind: FractalKind) -> &'static FractalConfig {
    match kind {
        FractalKind::Mandelbrot => &MANDELBROT_CONFIG,
        FractalKind::Julia => &JULIA_CONFIG,
    }
}

/// Color schemes understood by the color-mapping stage. The core passes the
/// scheme through untouched; this list is for clients and request defaults.
pub static COLOR_SCHEMES: &[&str] = &["classic", "rainbow", "fire", "ocean", "grayscale"];

/// A well-known Julia constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JuliaPreset {
    pub name: &'static str,
    pub c: Complex,
}

pub const DRAGON: JuliaPreset = JuliaPreset {
    name: "dragon",
    c: Complex::new(-0.7, 0.27015),
};

pub static JULIA_PRESETS: &[JuliaPreset] = &[
    DRAGON,
    JuliaPreset {
        name: "lightning",
        c: Complex::new(-0.7269, 0.1889),
    },
    JuliaPreset {
        name: "spiral",
        c: Complex::new(-0.8, 0.156),
    },
    JuliaPreset {
        name: "rabbit",
        c: Complex::new(-0.123, 0.745),
    },
    JuliaPreset {
        name: "airplane",
        c: Complex::new(-0.7269, 0.1889),
    },
    JuliaPreset {
        name: "douady_rabbit",
        c: Complex::new(-0.123, 0.745),
    },
    JuliaPreset {
        name: "san_marco_dragon",
        c: Complex::new(-0.75, 0.0),
    },
    JuliaPreset {
        name: "dendrite",
        c: Complex::new(0.0, 1.0),
    },
];

/// Look up a named Julia constant (case-insensitive).
pub fn julia_preset(name: &str) -> Option<&'static JuliaPreset> {
    JULIA_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}
