//! Transfer functions with numeric coefficients.

use num_complex::Complex64;

use super::pfd::Pfd;
use super::poly::{eval, find_roots, make_monic, trim};
use super::RootFinderConfig;
use crate::error::{Result, SfgError};
use crate::rational::{Coeff, RationalExpr};
use crate::vars::VarTable;

/// Magnitudes below this count as zero in the interval heuristics.
const MAGNITUDE_EPSILON: f64 = 1e-12;

/// `H(s) = factor · N(s) / D(s)` with monic `N` and `D`.
///
/// Zeros and poles are computed on first use and cached.
#[derive(Debug, Clone)]
pub struct TransferFunction {
    factor: f64,
    num: Vec<f64>,
    den: Vec<f64>,
    config: RootFinderConfig,
    zeros: Option<Vec<Complex64>>,
    poles: Option<Vec<Complex64>>,
}

impl TransferFunction {
    /// Build from coefficient lists, lowest degree first.
    pub fn new(num: &[f64], den: &[f64]) -> Result<Self> {
        if let Some(i) = num.iter().chain(den).position(|c| !c.is_finite()) {
            return Err(SfgError::degenerate(format!("coefficient {} is not finite", i)));
        }

        let mut den = trim(den).to_vec();
        if den.is_empty() {
            return Err(SfgError::degenerate("denominator is identically zero"));
        }
        let mut num = trim(num).to_vec();

        // cancel common powers of s
        let origin_roots = |p: &[f64]| p.iter().take_while(|&&c| c == 0.0).count();
        if !num.is_empty() {
            let shift = origin_roots(&num).min(origin_roots(&den));
            num.drain(..shift);
            den.drain(..shift);
        }

        let den_lead = make_monic(&mut den);
        let factor = if num.is_empty() {
            num.push(1.0);
            0.0
        } else {
            make_monic(&mut num) / den_lead
        };

        Ok(Self {
            factor,
            num,
            den,
            config: RootFinderConfig::default(),
            zeros: None,
            poles: None,
        })
    }

    /// Evaluate every symbolic coefficient against `params`.
    pub fn from_symbolic(rational: &RationalExpr, params: &VarTable) -> Result<Self> {
        let values = |poly: &[Coeff]| poly.iter().map(|c| c.eval(params)).collect::<Vec<f64>>();
        Self::new(&values(&rational.num), &values(&rational.den))
    }

    pub fn with_root_finder(mut self, config: RootFinderConfig) -> Self {
        self.config = config;
        self.zeros = None;
        self.poles = None;
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Monic numerator, lowest degree first.
    pub fn numerator(&self) -> &[f64] {
        &self.num
    }

    /// Monic denominator, lowest degree first.
    pub fn denominator(&self) -> &[f64] {
        &self.den
    }

    pub fn zeros(&mut self) -> Result<&[Complex64]> {
        if self.zeros.is_none() {
            self.zeros = Some(find_roots(&self.num, &self.config)?);
        }
        Ok(self.zeros.as_deref().unwrap_or_default())
    }

    pub fn poles(&mut self) -> Result<&[Complex64]> {
        if self.poles.is_none() {
            self.poles = Some(find_roots(&self.den, &self.config)?);
        }
        Ok(self.poles.as_deref().unwrap_or_default())
    }

    /// `H(s)` from the polynomial coefficients.
    pub fn eval(&self, s: Complex64) -> Complex64 {
        self.factor * eval(&self.num, s) / eval(&self.den, s)
    }

    /// Angular frequency range worth plotting.
    ///
    /// Two decades below the smallest and above the largest non-zero
    /// pole or zero magnitude; `(0.01, 100)` when there is none.
    pub fn frequency_interval(&mut self) -> Result<(f64, f64)> {
        let mut magnitudes: Vec<f64> = self.zeros()?.iter().map(|z| z.norm()).collect();
        magnitudes.extend(self.poles()?.iter().map(|p| p.norm()));

        let nonzero = magnitudes.into_iter().filter(|&m| m > MAGNITUDE_EPSILON);
        let (min, max) = nonzero.fold((f64::INFINITY, 0.0_f64), |(lo, hi), m| (lo.min(m), hi.max(m)));
        if max == 0.0 {
            return Ok((0.01, 100.0));
        }
        Ok((min * 0.01, max * 100.0))
    }

    /// Time range worth plotting: ten time constants of the slowest pole.
    pub fn time_interval(&mut self) -> Result<(f64, f64)> {
        let slowest = self
            .poles()?
            .iter()
            .map(|p| p.re.abs())
            .filter(|&r| r > MAGNITUDE_EPSILON)
            .fold(f64::INFINITY, f64::min);
        let slowest = if slowest.is_finite() { slowest } else { 1.0 };
        Ok((0.0, 10.0 / slowest))
    }

    /// Partial fractions of `H(s)`.
    pub fn impulse_pfd(&mut self) -> Result<Pfd> {
        self.pfd_with_integrators(0)
    }

    /// Partial fractions of `H(s) / s`.
    pub fn step_pfd(&mut self) -> Result<Pfd> {
        self.pfd_with_integrators(1)
    }

    /// Partial fractions of `H(s) / s^2`.
    pub fn ramp_pfd(&mut self) -> Result<Pfd> {
        self.pfd_with_integrators(2)
    }

    fn pfd_with_integrators(&mut self, count: usize) -> Result<Pfd> {
        let factor = self.factor;
        let numerator: Vec<Complex64> = self
            .num
            .iter()
            .map(|&c| Complex64::new(factor * c, 0.0))
            .collect();
        let mut poles = self.poles()?.to_vec();
        poles.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(count));
        Pfd::decompose(&numerator, &poles)
    }
}
