//! Class breaks.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::classifier::ClassifyError;

/// Strictly increasing upper class boundaries.
///
/// `k` breaks define the intervals `(-inf, b1], (b1, b2], ..., (b(k-1), +inf)`.
/// The last interval is open-ended so that values above the last break still
/// land in the top class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Breaks(Vec<f64>);

impl Breaks {
    /// Validate a break sequence.
    pub fn new(values: Vec<f64>) -> Result<Self, ClassifyError> {
        if values.is_empty() {
            return Err(ClassifyError::InvalidBreaks("no breaks given".to_string()));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(ClassifyError::InvalidBreaks(format!("non-finite break {v}")));
        }
        if let Some(w) = values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ClassifyError::InvalidBreaks(format!(
                "breaks must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self(values))
    }

    /// Build breaks from candidate cuts, dropping duplicates.
    ///
    /// Used by solvers whose cut points may coincide on tied data, where fewer
    /// classes than requested is a valid result.
    pub(crate) fn collapsed(mut values: Vec<f64>) -> Result<Self, ClassifyError> {
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self::new(values)
    }

    /// Number of classes.
    pub fn k(&self) -> usize {
        self.0.len()
    }

    /// The break values.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The last (largest) break.
    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Class index of a value: first `i` with `value <= b_i`, clamped to the
    /// top class.
    pub fn bin_of(&self, value: f64) -> usize {
        self.0.partition_point(|b| *b < value).min(self.0.len() - 1)
    }

    /// Bit-exact fingerprint of the break values.
    pub fn fingerprint(&self) -> String {
        let bits: Vec<u64> = self.0.iter().map(|b| b.to_bits()).collect();
        canonical_hash_hex(&bits)
    }
}

impl TryFrom<Vec<f64>> for Breaks {
    type Error = ClassifyError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Breaks> for Vec<f64> {
    fn from(breaks: Breaks) -> Self {
        breaks.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_increasing() {
        assert!(Breaks::new(vec![1.0, 1.0]).is_err());
        assert!(Breaks::new(vec![2.0, 1.0]).is_err());
        assert!(Breaks::new(vec![]).is_err());
        assert!(Breaks::new(vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_collapsed_dedups() {
        let b = Breaks::collapsed(vec![3.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(b.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bin_of_intervals() {
        let b = Breaks::new(vec![1.0, 5.0, 10.0]).unwrap();
        assert_eq!(b.bin_of(-100.0), 0);
        assert_eq!(b.bin_of(1.0), 0);
        assert_eq!(b.bin_of(1.5), 1);
        assert_eq!(b.bin_of(5.0), 1);
        assert_eq!(b.bin_of(10.0), 2);
        assert_eq!(b.bin_of(1e9), 2);
    }

    #[test]
    fn test_fingerprint_is_bit_exact() {
        let a = Breaks::new(vec![0.1 + 0.2, 1.0]).unwrap();
        let b = Breaks::new(vec![0.3, 1.0]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn test_serde_validates() {
        let ok: Breaks = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(ok.k(), 2);
        assert!(serde_json::from_str::<Breaks>("[2.0, 1.0]").is_err());
    }
}
