//! Numeric polynomials and the Durand–Kerner root finder.
//!
//! Coefficients are stored lowest degree first, as in
//! [`Poly`](crate::rational::Poly).

use std::f64::consts::PI;

use num_complex::Complex64;

use super::RootFinderConfig;
use crate::error::{Result, SfgError};

/// Relative part of the radius within which roots form one multiple root.
const CLUSTER_RADIUS: f64 = 1e-4;

/// Newton steps spent refining a multiple root.
const POLISH_ITERATIONS: usize = 8;

/// Drop leading zero coefficients (highest degrees).
pub fn trim(coeffs: &[f64]) -> &[f64] {
    let len = coeffs.iter().rposition(|&c| c != 0.0).map_or(0, |i| i + 1);
    &coeffs[..len]
}

/// Divide by the leading coefficient. Returns that coefficient.
///
/// Expects a trimmed, non-empty polynomial.
pub fn make_monic(coeffs: &mut [f64]) -> f64 {
    let lead = coeffs.last().copied().unwrap_or(1.0);
    for c in coeffs.iter_mut() {
        *c /= lead;
    }
    lead
}

/// Evaluate with Horner's scheme.
pub fn eval(coeffs: &[f64], x: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
}

/// Evaluate a polynomial with complex coefficients.
pub fn eval_complex(coeffs: &[Complex64], x: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
}

/// Product of two complex polynomials.
pub fn mul_complex(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Monic polynomial with the given roots.
pub fn from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    roots.iter().fold(vec![Complex64::new(1.0, 0.0)], |acc, &r| {
        mul_complex(&acc, &[-r, Complex64::new(1.0, 0.0)])
    })
}

/// All complex roots of a polynomial, with multiplicity.
///
/// Roots at the origin are split off exactly; the rest are found with
/// Durand–Kerner iteration from guesses spread on a circle enclosing all
/// roots, and near-equal results are averaged into multiple roots. Running
/// out of iterations returns the current estimates; only a diverging
/// iteration is an error.
pub fn find_roots(coeffs: &[f64], config: &RootFinderConfig) -> Result<Vec<Complex64>> {
    let coeffs = trim(coeffs);
    if coeffs.len() < 2 {
        return Ok(Vec::new());
    }

    let zeros = coeffs.iter().take_while(|&&c| c == 0.0).count();
    let mut monic = coeffs[zeros..].to_vec();
    make_monic(&mut monic);

    let mut roots = vec![Complex64::new(0.0, 0.0); zeros];
    roots.extend(durand_kerner(&monic, config)?);
    Ok(roots)
}

fn durand_kerner(monic: &[f64], config: &RootFinderConfig) -> Result<Vec<Complex64>> {
    let n = monic.len() - 1;
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![Complex64::new(-monic[0], 0.0)]),
        _ => {}
    }

    // Cauchy bound
    let radius = 1.0 + monic[..n].iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    let mut z: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(radius, 2.0 * PI * k as f64 / n as f64 + 0.25))
        .collect();

    let max_iterations = config.iterations_for(monic.len());
    let mut converged = false;
    for iteration in 0..max_iterations {
        let mut max_step = 0.0_f64;
        for i in 0..n {
            // Approximations closer than sqrt(tolerance) belong to one multiple
            // root and would blow the correction up.
            let denom = (0..n)
                .filter(|&j| j != i && (z[i] - z[j]).norm_sqr() >= config.tolerance)
                .fold(Complex64::new(1.0, 0.0), |acc, j| acc * (z[i] - z[j]));
            let step = eval(monic, z[i]) / denom;
            z[i] -= step;
            max_step = max_step.max(step.norm());
        }
        if max_step < config.tolerance {
            log::trace!("Durand-Kerner converged after {} iterations", iteration + 1);
            converged = true;
            break;
        }
    }

    if z.iter().any(|r| !r.is_finite()) {
        log::warn!("Durand-Kerner diverged within {} iterations", max_iterations);
        return Err(SfgError::RootsDidNotConverge {
            iterations: max_iterations,
        });
    }
    if !converged {
        log::debug!("Durand-Kerner used all {} iterations", max_iterations);
    }
    merge_clusters(monic, &mut z, config.tolerance);
    Ok(z)
}

/// Replace each group of near-equal roots by one multiple root.
///
/// An `m`-fold root is only resolved to about `tolerance^(1/m)`, so the
/// absolute part of the radius is `tolerance^(1/4)`. The group mean is then
/// refined with [`polish`].
fn merge_clusters(monic: &[f64], roots: &mut [Complex64], tolerance: f64) {
    let mut assigned = vec![false; roots.len()];
    for i in 0..roots.len() {
        if assigned[i] {
            continue;
        }
        let radius = tolerance.powf(0.25) + CLUSTER_RADIUS * roots[i].norm();
        let members: Vec<usize> = (i..roots.len())
            .filter(|&j| !assigned[j] && (roots[j] - roots[i]).norm() < radius)
            .collect();
        if members.len() < 2 {
            continue;
        }
        let mean = members.iter().map(|&j| roots[j]).sum::<Complex64>() / members.len() as f64;
        let root = polish(monic, mean, members.len())
            .filter(|r| (r - mean).norm() < radius)
            .unwrap_or(mean);
        log::trace!("merged {} roots into {}", members.len(), root);
        for &j in &members {
            roots[j] = root;
            assigned[j] = true;
        }
    }
}

fn derivative(coeffs: &[f64]) -> Vec<f64> {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, &c)| k as f64 * c)
        .collect()
}

/// Newton's method on the `(m-1)`-th derivative, where an `m`-fold root is
/// simple.
fn polish(monic: &[f64], guess: Complex64, multiplicity: usize) -> Option<Complex64> {
    let mut target = monic.to_vec();
    for _ in 1..multiplicity {
        target = derivative(&target);
    }
    let slope = derivative(&target);

    let mut z = guess;
    for _ in 0..POLISH_ITERATIONS {
        let d = eval(&slope, z);
        if d.norm() == 0.0 {
            break;
        }
        let step = eval(&target, z) / d;
        z -= step;
        if step.norm() <= f64::EPSILON * (1.0 + z.norm()) {
            break;
        }
    }
    z.is_finite().then_some(z)
}
