//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the model code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::assemble::AssembledCurve;
use crate::domain::{Overdensity, RunConfig, Spacing};

/// Format the run header plus one shape-parameter line per redshift.
pub fn format_run_summary(mode: &str, config: &RunConfig, curves: &[AssembledCurve]) -> String {
    let mut out = String::new();

    out.push_str("=== spk - baryonic suppression of P(k) ===\n");
    out.push_str(&format!(
        "Relation: {mode} | SO: {} ({})\n",
        config.overdensity,
        config.overdensity.mass_label()
    ));
    out.push_str(&format!(
        "Cosmology: flat LCDM, H0={:.2}, Omega_m={:.5}, Omega_b={:.5}\n",
        config.h0, config.omega_m, config.omega_b
    ));
    let spacing = match config.grid.spacing {
        Spacing::Log => "log",
        Spacing::Linear => "linear",
    };
    out.push_str(&format!(
        "Grid: k=[{}, {}] h/Mpc | n={} | {spacing}\n",
        config.grid.k_min, config.grid.k_max, config.grid.n_k
    ));
    match &config.calibration_path {
        Some(path) => out.push_str(&format!("Calibration: {}\n", path.display())),
        None => out.push_str("Calibration: built-in illustrative table (pass --calibration for the fitted one)\n"),
    }
    if let Some(path) = &config.stat_errors_path {
        out.push_str(&format!("Statistical errors: {}\n", path.display()));
    }

    out.push_str("\nShape parameters:\n");
    out.push_str(
        format!(
            "{:>8} {:>12} {:>10} {:>8} {:>8}\n",
            "z", "M_anchor", "amplitude", "slope", "hull"
        )
        .trim_end(),
    );
    out.push('\n');
    for c in curves {
        out.push_str(&format!(
            "{:>8.3} {:>12.3e} {:>10.4} {:>8.4} {:>8}\n",
            c.z,
            c.shape.anchor_mass,
            c.shape.amplitude,
            c.shape.slope,
            if c.shape.within_hull { "in" } else { "OUT" },
        ));
    }

    let flagged: usize = curves
        .iter()
        .map(|c| c.extrapolated.iter().filter(|&&f| f).count())
        .sum();
    if flagged > 0 {
        out.push_str(&format!(
            "\nNote: {flagged} point(s) lie outside the calibrated region (marked `*`).\n"
        ));
    }
    let uncovered: usize = curves
        .iter()
        .filter_map(|c| c.errors.as_ref())
        .map(|e| e.iter().filter(|b| b.is_none()).count())
        .sum();
    if uncovered > 0 {
        out.push_str(&format!(
            "Note: {uncovered} point(s) fall outside the error table and have no band.\n"
        ));
    }

    out
}

/// Format `(k, S)` for every curve, one column per redshift.
///
/// At most `max_rows` rows are printed, evenly thinned across the grid.
pub fn format_suppression_table(curves: &[AssembledCurve], max_rows: usize) -> String {
    let mut out = String::new();
    let Some(first) = curves.first() else {
        return out;
    };

    let mut header = format!("{:>10}", "k [h/Mpc]");
    for c in curves {
        header.push_str(&format!(" {:>12}", format!("S(z={})", trim_float(c.z))));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for i in thinned_indices(first.k.len(), max_rows) {
        let mut row = format!("{:>10.4}", first.k[i]);
        for c in curves {
            let mark = if c.extrapolated[i] { "*" } else { " " };
            row.push_str(&format!(" {:>11.6}{mark}", c.sup[i]));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

/// Format `M_opt(k)` for one redshift.
pub fn format_optimal_mass(overdensity: Overdensity, z: f64, k: &[f64], masses: &[f64]) -> String {
    let mut out = format!(
        "Optimal mass ({}), z={}\n",
        overdensity.mass_label(),
        trim_float(z)
    );
    out.push_str(format!("{:>10} {:>14}\n", "k [h/Mpc]", "M_opt [M_sun]").trim_end());
    out.push('\n');
    for (k, m) in k.iter().zip(masses) {
        out.push_str(&format!("{k:>10.4} {m:>14.4e}\n"));
    }
    out
}

/// Format fitting limits for one redshift.
pub fn format_limits(overdensity: Overdensity, z: f64, masses: &[f64], min: &[f64], max: &[f64]) -> String {
    let mut out = format!(
        "Fitting limits (f_b / (Omega_b/Omega_m)), {}, z={}\n",
        overdensity.mass_label(),
        trim_float(z)
    );
    out.push_str(format!("{:>14} {:>10} {:>10}\n", "M [M_sun]", "min", "max").trim_end());
    out.push('\n');
    for ((m, lo), hi) in masses.iter().zip(min).zip(max) {
        out.push_str(&format!("{m:>14.4e} {lo:>10.5} {hi:>10.5}\n"));
    }
    out
}

fn thinned_indices(n: usize, max_rows: usize) -> Vec<usize> {
    if n <= max_rows || max_rows < 2 {
        return (0..n).collect();
    }
    let mut idx: Vec<usize> = (0..max_rows)
        .map(|i| (i as f64 * (n - 1) as f64 / (max_rows - 1) as f64).round() as usize)
        .collect();
    idx.dedup();
    idx
}

fn trim_float(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShapeParameters;

    fn curve(z: f64, extrapolated: Vec<bool>) -> AssembledCurve {
        AssembledCurve {
            overdensity: Overdensity::So200c,
            z,
            k: vec![0.1, 1.0, 8.0],
            sup: vec![0.999, 0.95, 0.8],
            extrapolated,
            baryon_fraction: vec![0.5; 3],
            shape: ShapeParameters {
                anchor_mass: 1e14,
                amplitude: 0.6,
                slope: 0.275,
                within_hull: true,
            },
            errors: None,
        }
    }

    #[test]
    fn table_marks_extrapolated_points() {
        let text = format_suppression_table(
            &[curve(0.125, vec![false, false, true]), curve(1.0, vec![false; 3])],
            50,
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("S(z=0.125)"));
        assert!(lines[0].contains("S(z=1)"));
        assert!(lines[3].contains("0.800000*"));
        assert!(!lines[1].contains('*'));
    }

    #[test]
    fn summary_names_the_calibration_and_uncovered_bands() {
        let mut config = RunConfig {
            overdensity: Overdensity::So200c,
            redshifts: vec![0.125],
            grid: crate::assemble::GridSpec::default(),
            h0: 67.66,
            omega_m: 0.30966,
            omega_b: 0.04897,
            calibration_path: None,
            stat_errors_path: None,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_curve: None,
        };
        let text = format_run_summary("power_law", &config, &[curve(0.125, vec![false; 3])]);
        assert!(text.contains("built-in illustrative table"), "{text}");
        assert!(!text.contains("Statistical errors"));

        config.calibration_path = Some("fit.json".into());
        config.stat_errors_path = Some("errors.csv".into());
        let mut with_bands = curve(0.125, vec![false; 3]);
        with_bands.errors = Some(vec![Some(crate::domain::ErrorBand::default()), None, None]);
        let text = format_run_summary("power_law", &config, &[with_bands]);
        assert!(text.contains("Calibration: fit.json"));
        assert!(text.contains("Statistical errors: errors.csv"));
        assert!(text.contains("2 point(s) fall outside the error table"), "{text}");
    }

    #[test]
    fn thinning_keeps_endpoints() {
        let idx = thinned_indices(100, 5);
        assert_eq!(idx.first(), Some(&0));
        assert_eq!(idx.last(), Some(&99));
        assert_eq!(idx.len(), 5);
        assert_eq!(thinned_indices(3, 10), vec![0, 1, 2]);
    }

    #[test]
    fn trims_trailing_zeros() {
        assert_eq!(trim_float(0.5), "0.5");
        assert_eq!(trim_float(2.0), "2");
        assert_eq!(trim_float(0.125), "0.125");
    }
}
