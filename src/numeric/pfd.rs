//! Partial-fraction decomposition.
//!
//! For a proper fraction `N(s) / Π(s - p_i)^m_i` the residues `A_ik` of
//!
//! ```text
//!   N(s)         m_i      A_ik
//!  ------  =  Σ   Σ   -----------
//!   D(s)      i  k=1  (s - p_i)^k
//! ```
//!
//! follow from multiplying both sides by `D(s)` and matching coefficients,
//! which gives one linear equation per power of `s`.

use num_complex::Complex64;

use super::matrix::CMatrix;
use super::poly::from_roots;
use crate::error::{Result, SfgError};

/// Poles closer than this (relative) are treated as one repeated pole.
const POLE_MERGE_TOLERANCE: f64 = 1e-9;

/// `residue / (s - pole)^power`.
#[derive(Debug, Clone, PartialEq)]
pub struct PfdTerm {
    pub pole: Complex64,
    pub power: usize,
    pub residue: Complex64,
}

impl PfdTerm {
    pub fn eval(&self, s: Complex64) -> Complex64 {
        self.residue / (s - self.pole).powi(self.power as i32)
    }

    /// Time-domain contribution `A t^(k-1) / (k-1)! e^(p t)`.
    pub fn inverse_laplace(&self, t: f64) -> Complex64 {
        let k = self.power - 1;
        let factorial: f64 = (1..=k).map(|i| i as f64).product();
        self.residue * t.powi(k as i32) / factorial * (self.pole * t).exp()
    }
}

/// Sum of partial-fraction terms.
#[derive(Debug, Clone, Default)]
pub struct Pfd {
    terms: Vec<PfdTerm>,
}

impl Pfd {
    /// Decompose `numerator(s) / Π(s - poles[i])`.
    ///
    /// The numerator is lowest degree first and must have a lower degree
    /// than the number of poles. Terms whose residue is exactly zero are
    /// left out.
    pub fn decompose(numerator: &[Complex64], poles: &[Complex64]) -> Result<Self> {
        let n = poles.len();
        let num_degree = match numerator.iter().rposition(|c| c.norm() != 0.0) {
            Some(d) => d,
            None => return Ok(Self::default()),
        };
        if num_degree >= n {
            return Err(SfgError::ImproperFraction {
                num_degree,
                den_degree: n,
            });
        }

        let groups = group_poles(poles);
        let mut unknowns = Vec::with_capacity(n);
        let mut system = CMatrix::new(n);
        for (i, &(pole, multiplicity)) in groups.iter().enumerate() {
            for power in 1..=multiplicity {
                // D(s) / (s - pole)^power
                let mut roots = Vec::with_capacity(n - power);
                for (j, &(other, m)) in groups.iter().enumerate() {
                    let count = if i == j { m - power } else { m };
                    roots.extend(std::iter::repeat(other).take(count));
                }
                let column = unknowns.len();
                for (row, c) in from_roots(&roots).into_iter().enumerate() {
                    system.set(row, column, c);
                }
                unknowns.push((pole, power));
            }
        }

        let mut rhs = vec![Complex64::new(0.0, 0.0); n];
        rhs[..=num_degree].copy_from_slice(&numerator[..=num_degree]);
        let residues = system.lu()?.solve(&rhs)?;

        let terms: Vec<PfdTerm> = unknowns
            .into_iter()
            .zip(residues)
            .filter(|(_, residue)| residue.norm() != 0.0)
            .map(|((pole, power), residue)| PfdTerm { pole, power, residue })
            .collect();
        log::trace!("{} partial fraction terms for {} poles", terms.len(), n);
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[PfdTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Frequency-domain value at `s`.
    pub fn eval(&self, s: Complex64) -> Complex64 {
        self.terms.iter().map(|term| term.eval(s)).sum()
    }

    /// Time-domain value at `t`, the real part of the inverse transform.
    pub fn inverse_laplace(&self, t: f64) -> f64 {
        self.terms
            .iter()
            .map(|term| term.inverse_laplace(t))
            .sum::<Complex64>()
            .re
    }
}

/// Distinct poles with their multiplicities, in first-seen order.
fn group_poles(poles: &[Complex64]) -> Vec<(Complex64, usize)> {
    let mut groups: Vec<(Complex64, usize)> = Vec::new();
    for &p in poles {
        let tolerance = POLE_MERGE_TOLERANCE * (1.0 + p.norm());
        match groups.iter_mut().find(|(q, _)| (p - *q).norm() <= tolerance) {
            Some((_, count)) => *count += 1,
            None => groups.push((p, 1)),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn re(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
    }

    fn residue(pfd: &Pfd, pole: f64, power: usize) -> Complex64 {
        pfd.terms()
            .iter()
            .find(|t| t.pole.re == pole && t.power == power)
            .map(|t| t.residue)
            .unwrap()
    }

    #[test]
    fn test_double_pole() {
        // (s + 3) / ((s + 1)^2 (s + 2))
        let num = re(&[3.0, 1.0]);
        let pfd = Pfd::decompose(&num, &re(&[-1.0, -1.0, -2.0])).unwrap();
        assert_eq!(pfd.terms().len(), 3);
        assert_eq!(pfd.terms().iter().filter(|t| t.pole.re == -1.0).count(), 2);

        // cover-up on the highest power: N(p) / (p + 2) at p = -1
        let heaviside = (-1.0 + 3.0) / (-1.0 + 2.0);
        assert_abs_diff_eq!(residue(&pfd, -1.0, 2).re, heaviside, epsilon = 1e-12);
        assert_abs_diff_eq!(residue(&pfd, -1.0, 1).re, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(residue(&pfd, -2.0, 1).re, 1.0, epsilon = 1e-12);

        let s = Complex64::new(0.5, 1.0);
        let direct = (s + 3.0) / ((s + 1.0).powi(2) * (s + 2.0));
        let value = pfd.eval(s);
        assert_abs_diff_eq!(value.re, direct.re, epsilon = 1e-12);
        assert_abs_diff_eq!(value.im, direct.im, epsilon = 1e-12);

        let t: f64 = 1.3;
        let expected = -(-t).exp() + 2.0 * t * (-t).exp() + (-2.0 * t).exp();
        assert_abs_diff_eq!(pfd.inverse_laplace(t), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_residue_is_dropped() {
        // (s + 2) / ((s + 1)(s + 2))
        let pfd = Pfd::decompose(&re(&[2.0, 1.0]), &re(&[-1.0, -2.0])).unwrap();
        assert_eq!(pfd.terms().len(), 1);
        assert_eq!(pfd.terms()[0].pole, Complex64::new(-1.0, 0.0));
        assert_abs_diff_eq!(pfd.terms()[0].residue.re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_complex_poles_give_real_response() {
        // 1 / (s^2 + 2s + 5): e^-t sin(2t) / 2
        let poles = vec![Complex64::new(-1.0, 2.0), Complex64::new(-1.0, -2.0)];
        let pfd = Pfd::decompose(&re(&[1.0]), &poles).unwrap();
        for t in [0.0_f64, 0.4, 1.7] {
            let expected = (-t).exp() * (2.0 * t).sin() / 2.0;
            assert_abs_diff_eq!(pfd.inverse_laplace(t), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_improper_fraction_rejected() {
        let err = Pfd::decompose(&re(&[1.0, 0.0, 1.0]), &re(&[-1.0, -2.0])).unwrap_err();
        assert!(matches!(
            err,
            SfgError::ImproperFraction {
                num_degree: 2,
                den_degree: 2
            }
        ));
        assert!(Pfd::decompose(&re(&[0.0]), &re(&[-1.0])).unwrap().is_empty());
    }
}
