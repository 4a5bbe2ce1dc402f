//! ASCII plotting of `S(k)` for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The x axis is logarithmic in k. Each redshift gets its own line glyph
//! (`-`, `=`, `~`, `+`, `:`); samples flagged as extrapolated are drawn as `*`.

use crate::assemble::AssembledCurve;
use crate::domain::CurveFile;

const GLYPHS: [char; 5] = ['-', '=', '~', '+', ':'];

struct Series<'a> {
    label: String,
    k: &'a [f64],
    sup: &'a [f64],
    extrapolated: &'a [bool],
}

/// Render in-memory curves.
pub fn render_suppression_plot(curves: &[AssembledCurve], width: usize, height: usize) -> String {
    let series: Vec<Series<'_>> = curves
        .iter()
        .map(|c| Series {
            label: format!("z={} ({})", c.z, c.overdensity),
            k: &c.k,
            sup: &c.sup,
            extrapolated: &c.extrapolated,
        })
        .collect();
    render_plot(&series, width, height)
}

/// Render curves loaded from a curve JSON file.
pub fn render_curve_files(files: &[CurveFile], width: usize, height: usize) -> String {
    let series: Vec<Series<'_>> = files
        .iter()
        .map(|f| Series {
            label: format!("z={} ({})", f.z, f.overdensity),
            k: &f.grid.k,
            sup: &f.grid.sup,
            extrapolated: &f.grid.extrapolated,
        })
        .collect();
    render_plot(&series, width, height)
}

fn render_plot(series: &[Series<'_>], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = ln_k_range(series).unwrap_or((0.1f64.ln(), 8.0f64.ln()));
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (s, glyph) in series.iter().zip(GLYPHS.iter().cycle()) {
        let points: Vec<(f64, f64)> = s
            .k
            .iter()
            .zip(s.sup)
            .filter(|(k, y)| **k > 0.0 && y.is_finite())
            .map(|(k, y)| (k.ln(), *y))
            .collect();
        draw_curve(&mut grid, &points, x_min, x_max, y_min, y_max, *glyph);
    }

    // Flags overlay every line.
    for s in series {
        for ((k, y), flag) in s.k.iter().zip(s.sup).zip(s.extrapolated) {
            if *flag && *k > 0.0 && y.is_finite() {
                let x = map_x(k.ln(), x_min, x_max, width);
                let yy = map_y(*y, y_min, y_max, height);
                grid[yy][x] = '*';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: k=[{:.3}, {:.3}] h/Mpc (log) | S=[{y_min:.4}, {y_max:.4}]\n",
        x_min.exp(),
        x_max.exp()
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for (s, glyph) in series.iter().zip(GLYPHS.iter().cycle()) {
        out.push_str(&format!("{glyph} {}\n", s.label));
    }

    out
}

fn ln_k_range(series: &[Series<'_>]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for s in series {
        for &k in s.k.iter().filter(|k| **k > 0.0) {
            min_x = min_x.min(k.ln());
            max_x = max_x.max(k.ln());
        }
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(series: &[Series<'_>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for &y in s.sup.iter().filter(|y| y.is_finite()) {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    glyph: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, glyph);
        } else if grid[yy][xx] == ' ' {
            grid[yy][xx] = glyph;
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
