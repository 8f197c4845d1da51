//! Linear congruential generator and the truncated sample it produces.
//!
//! The recurrence is `x[i] = (a * x[i-1] + c) mod m` with `a = 1 + 2k` (always
//! odd) and `m = 2^exponent`. Each state is mapped to `x[i] / m` truncated to
//! five decimal places. The seed itself is never emitted.

use serde::Serialize;

use crate::error::{Error, Result};

/// Fractional decimal digits kept in every generated value.
pub const DECIMALS: u32 = 5;

/// Largest supported modulus exponent; states must fit in a `u64`.
pub const MAX_EXPONENT: u32 = 64;

/// Below this many values the statistical tests have very little power.
pub const RECOMMENDED_MIN_COUNT: usize = 10;

const SCALE_INT: u128 = 10u128.pow(DECIMALS);
const SCALE: f64 = SCALE_INT as f64;

// ═══════════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated generator inputs. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratorParams {
    seed: u64,
    k: i64,
    c: i64,
    exponent: u32,
    count: usize,
}

impl GeneratorParams {
    /// Validate and build a parameter set.
    ///
    /// Fails with [`Error::InvalidParameter`] if `exponent` is outside
    /// `1..=64` or `count` is zero.
    pub fn new(seed: u64, k: i64, c: i64, exponent: u32, count: usize) -> Result<Self> {
        if exponent < 1 {
            return Err(Error::invalid(format!("exponent must be >= 1, got {exponent}")));
        }
        if exponent > MAX_EXPONENT {
            return Err(Error::invalid(format!(
                "exponent must be <= {MAX_EXPONENT}, got {exponent}"
            )));
        }
        if count < 1 {
            return Err(Error::invalid("count must be >= 1, got 0"));
        }
        Ok(Self {
            seed,
            k,
            c,
            exponent,
            count,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn k(&self) -> i64 {
        self.k
    }

    pub fn c(&self) -> i64 {
        self.c
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Multiplier `a = 1 + 2k`.
    pub fn multiplier(&self) -> i128 {
        1 + 2 * self.k as i128
    }

    /// Modulus `m = 2^exponent`.
    pub fn modulus(&self) -> u128 {
        1u128 << self.exponent
    }

    /// Run the recurrence and collect `count` truncated values.
    pub fn generate(&self) -> Sample {
        let m = self.modulus();
        // Reduce a and c into [0, m) so the product below fits in u128.
        let a = self.multiplier().rem_euclid(m as i128) as u128;
        let c = (self.c as i128).rem_euclid(m as i128) as u128;

        if self.count < RECOMMENDED_MIN_COUNT {
            log::warn!(
                "only {} values generated; the test battery wants {RECOMMENDED_MIN_COUNT}+",
                self.count
            );
        }

        let mut states = Vec::with_capacity(self.count);
        let mut values = Vec::with_capacity(self.count);
        let mut x = self.seed as u128;
        for _ in 0..self.count {
            x = (a * x + c) % m;
            states.push(x as u64);
            // Exact integer truncation: floor(x * 10^5 / m).
            let digits = x * SCALE_INT / m;
            values.push(digits as f64 / SCALE);
        }

        log::debug!(
            "generated {} values (a={}, c={}, m=2^{})",
            self.count,
            self.multiplier(),
            self.c,
            self.exponent
        );

        Sample {
            states: Some(states),
            values,
        }
    }
}

/// Generate `count` values from the LCG defined by `seed`, `k`, `c` and
/// `exponent`.
pub fn generate(seed: u64, k: i64, c: i64, exponent: u32, count: usize) -> Result<Sample> {
    GeneratorParams::new(seed, k, c, exponent, count).map(|params| params.generate())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sample
// ═══════════════════════════════════════════════════════════════════════════════

/// An ordered, immutable sequence of values in `[0, 1)`.
///
/// Samples built by the generator also carry the integer state behind each
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    states: Option<Vec<u64>>,
    values: Vec<f64>,
}

/// One row of a generated sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Draw {
    /// 1-based position in the sequence.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u64>,
    pub value: f64,
}

impl Sample {
    /// Wrap externally produced values. Every value must be finite and lie in
    /// `[0, 1)`, and the sample must not be empty.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::invalid("sample must contain at least one value"));
        }
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0 || **v >= 1.0)
        {
            return Err(Error::invalid(format!(
                "value {v} at position {} is outside [0, 1)",
                i + 1
            )));
        }
        Ok(Self {
            states: None,
            values,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Integer states `x[1..=count]`, when the sample came from the generator.
    pub fn states(&self) -> Option<&[u64]> {
        self.states.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// Rows of `(index, state, value)` in generation order.
    pub fn draws(&self) -> impl Iterator<Item = Draw> + '_ {
        self.values.iter().enumerate().map(move |(i, &value)| Draw {
            index: i + 1,
            state: self.states.as_ref().map(|s| s[i]),
            value,
        })
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for Sample {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl<'a> IntoIterator for &'a Sample {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Truncation
// ═══════════════════════════════════════════════════════════════════════════════

/// Truncate toward zero to five fractional decimal digits.
///
/// `v * 10^5` can land one ulp below an integer (`0.29 * 1e5` is
/// `28999.999999999996`), so the candidate is corrected against `v` itself.
/// This keeps `truncate5(truncate5(v)) == truncate5(v)`.
pub fn truncate5(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let mag = v.abs();
    let mut t = (mag * SCALE).trunc();
    if (t + 1.0) / SCALE <= mag {
        t += 1.0;
    } else if t > 0.0 && t / SCALE > mag {
        t -= 1.0;
    }
    (t / SCALE).copysign(v)
}

/// The five truncated fractional digits of `v` as an integer in `0..100_000`.
///
/// `0.25` yields `25000`. Only meaningful for values in `[0, 1)`.
pub fn truncated_digits(v: f64) -> u32 {
    ((truncate5(v.abs()) * SCALE).round() as u32).min((SCALE_INT - 1) as u32)
}

/// Render a value with at most five fractional digits, dropping trailing
/// zeros (`0.25`, `0.8125`, `0`).
pub fn format_truncated(v: f64) -> String {
    let s = format!("{:.5}", truncate5(v));
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_checked_sequence() {
        // a = 3, m = 16: 3*1+1=4, 3*4+1=13, 40%16=8, 25%16=9, 28%16=12
        let sample = generate(1, 1, 1, 4, 5).unwrap();
        assert_eq!(sample.states(), Some(&[4u64, 13, 8, 9, 12][..]));
        assert_eq!(sample.values(), &[0.25, 0.8125, 0.5, 0.5625, 0.75]);
    }

    #[test]
    fn rejects_zero_exponent() {
        assert!(matches!(
            generate(1, 1, 1, 0, 5),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_oversized_exponent() {
        assert!(matches!(
            generate(1, 1, 1, 65, 5),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_zero_count() {
        assert!(matches!(
            generate(1, 1, 1, 4, 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn multiplier_is_always_odd() {
        for k in [-7i64, -1, 0, 1, 2, 1_000_003] {
            let p = GeneratorParams::new(0, k, 0, 8, 1).unwrap();
            assert_eq!(p.multiplier().rem_euclid(2), 1, "k={k}");
        }
    }

    #[test]
    fn negative_parameters_stay_in_range() {
        let sample = generate(3, -5, -11, 6, 200).unwrap();
        for (&x, &r) in sample.states().unwrap().iter().zip(sample.values()) {
            assert!(x < 64);
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn full_width_modulus_does_not_overflow() {
        let sample = generate(u64::MAX, i64::MAX, i64::MAX, 64, 100).unwrap();
        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|&r| (0.0..1.0).contains(&r)));
    }

    #[test]
    fn hull_dobell_parameters_give_full_period() {
        // a = 5 ≡ 1 (mod 4) and c odd: Hull–Dobell gives period m.
        let sample = generate(0, 2, 1, 8, 256).unwrap();
        let mut states = sample.states().unwrap().to_vec();
        states.sort_unstable();
        states.dedup();
        assert_eq!(states.len(), 256);
    }

    #[test]
    fn truncate5_truncates_instead_of_rounding() {
        assert_eq!(truncate5(0.123_459_9), 0.12345);
        assert_eq!(truncate5(0.999_999), 0.99999);
        assert_eq!(truncate5(0.0), 0.0);
        assert_eq!(truncate5(-0.123_459), -0.12345);
    }

    #[test]
    fn truncate5_is_idempotent_on_five_digit_values() {
        for t in [29_000u32, 57_000, 1, 99_999, 33_333, 70_001] {
            let v = t as f64 / SCALE;
            assert_eq!(truncate5(v), v, "t={t}");
            assert_eq!(truncated_digits(v), t);
        }
    }

    #[test]
    fn scale_follows_decimals() {
        assert_eq!(SCALE_INT, 100_000);
        assert_eq!(truncated_digits(0.999_999_9), 99_999);
    }

    #[test]
    fn format_drops_trailing_zeros() {
        assert_eq!(format_truncated(0.25), "0.25");
        assert_eq!(format_truncated(0.8125), "0.8125");
        assert_eq!(format_truncated(0.0), "0");
        assert_eq!(format_truncated(0.123_456_7), "0.12345");
    }

    #[test]
    fn from_values_validates_range() {
        assert!(Sample::from_values(vec![0.0, 0.5, 0.99]).is_ok());
        assert!(Sample::from_values(vec![]).is_err());
        assert!(Sample::from_values(vec![0.5, 1.0]).is_err());
        assert!(Sample::from_values(vec![-0.1]).is_err());
        assert!(Sample::from_values(vec![f64::NAN]).is_err());
    }

    #[test]
    fn draws_are_one_based_and_carry_states() {
        let sample = generate(1, 1, 1, 4, 2).unwrap();
        let draws: Vec<_> = sample.draws().collect();
        assert_eq!(draws[0].index, 1);
        assert_eq!(draws[0].state, Some(4));
        assert_eq!(draws[1].value, 0.8125);

        let external = Sample::from_values(vec![0.3]).unwrap();
        assert_eq!(external.draws().next().unwrap().state, None);
    }
}
