use alloc::vec::Vec;

use iir_rs_core::complex::{infinite_root, is_finite_root, IirFloat};
use nalgebra::Complex;

/// Poles and zeros of one pipeline stage.
///
/// `poles[i]` and `zeros[i]` are positionally paired: the section synthesizer
/// consumes them together, so every stage preserves equal lengths and keeps
/// conjugate partners adjacent.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSet<F> {
    /// Pole locations.
    pub poles: Vec<Complex<F>>,
    /// Zero locations; `infinite_root()` marks a zero at infinity.
    pub zeros: Vec<Complex<F>>,
}

impl<F: IirFloat> RootSet<F> {
    /// An all-pole set: every zero sits at infinity.
    pub fn all_pole(poles: Vec<Complex<F>>) -> Self {
        let zeros = alloc::vec![infinite_root(); poles.len()];
        Self { poles, zeros }
    }

    /// Number of pole/zero entries.
    pub fn len(&self) -> usize {
        self.poles.len()
    }

    /// True when the set holds no roots.
    pub fn is_empty(&self) -> bool {
        self.poles.is_empty()
    }

    /// Keep only the first `n` pole/zero entries.
    pub fn truncate(&mut self, n: usize) {
        self.poles.truncate(n);
        self.zeros.truncate(n);
    }

    /// Apply `f` to every pole and zero, producing a new set.
    pub fn map<G>(&self, mut f: G) -> Self
    where
        G: FnMut(Complex<F>) -> Complex<F>,
    {
        Self {
            poles: self.poles.iter().map(|p| f(*p)).collect(),
            zeros: self.zeros.iter().map(|z| f(*z)).collect(),
        }
    }

    /// Largest pole magnitude, `0` for an empty set.
    pub fn max_pole_radius(&self) -> F {
        self.poles
            .iter()
            .map(|p| p.norm())
            .fold(F::zero(), |acc, r| acc.max(r))
    }

    /// True when every pole and zero has finite components.
    pub fn is_finite(&self) -> bool {
        self.poles.iter().all(is_finite_root) && self.zeros.iter().all(is_finite_root)
    }

    /// Interleave as `pole, zero, pole, zero, ...`, both conjugates included.
    pub fn pole_zero_plot(&self) -> Vec<Complex<F>> {
        self.poles
            .iter()
            .zip(self.zeros.iter())
            .flat_map(|(p, z)| [*p, *z])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iir_rs_core::complex::is_infinite_root;

    #[test]
    fn all_pole_sets_carry_infinite_zeros() {
        let set = RootSet::all_pole(vec![
            Complex::new(-0.5f64, 0.5),
            Complex::new(-0.5, -0.5),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.zeros.iter().all(is_infinite_root));
        assert!(!set.is_finite());
    }

    #[test]
    fn plot_array_interleaves_poles_and_zeros() {
        let set = RootSet {
            poles: vec![Complex::new(0.5f64, 0.1), Complex::new(0.5, -0.1)],
            zeros: vec![Complex::new(-1.0, 0.0), Complex::new(-1.0, 0.0)],
        };
        let plot = set.pole_zero_plot();
        assert_eq!(plot.len(), 4);
        assert_eq!(plot[0], set.poles[0]);
        assert_eq!(plot[1], set.zeros[0]);
        assert_eq!(plot[2], set.poles[1]);
        assert_eq!(plot[3], set.zeros[1]);
    }
}
