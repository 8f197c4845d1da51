//! Statistical test battery for LCG samples.
//!
//! Six hypothesis tests check that a sample behaves like independent
//! Uniform(0,1) draws before it drives a random walk. Each test returns a
//! [`TestResult`] with an accept/reject decision and the numbers behind it
//! (statistic, critical value(s), degrees of freedom). Tests only read the
//! sample and are independent of each other.

pub mod config;
pub mod result;

use std::collections::BTreeMap;

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use lcgwalk_core::truncated_digits;
pub use lcgwalk_core::{Error, Result, Sample};

pub use config::{TestConfig, TestKind, TestSetting};
pub use result::TestResult;

/// Significance level used when a caller does not choose one.
pub const DEFAULT_ALPHA: f64 = 0.05;

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("alpha must lie in (0, 1), got {alpha}")))
    }
}

fn require_len(name: &str, data: &[f64], min: usize) -> Result<usize> {
    let n = data.len();
    if n < min {
        return Err(Error::invalid(format!("{name}: need at least {min} values, got {n}")));
    }
    Ok(n)
}

fn decision(approved: bool, detail: String) -> String {
    if approved {
        format!("H0 accepted: {detail}")
    } else {
        format!("H0 rejected: {detail}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test primitives
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-sided standard normal critical value `Φ⁻¹(1 − alpha/2)`.
pub fn z_critical(alpha: f64) -> Result<f64> {
    check_alpha(alpha)?;
    Ok(Normal::standard().inverse_cdf(1.0 - alpha / 2.0))
}

/// Chi-square quantile: the `x` with `P(X ≤ x) = p` for `df` degrees of freedom.
///
/// Bisects on the CDF to a relative width of 1e-12.
pub fn chi2_quantile(df: f64, p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::invalid(format!("chi-square probability must lie in (0, 1), got {p}")));
    }
    let dist = ChiSquared::new(df).map_err(|e| {
        Error::invalid(format!("chi-square with {df} degrees of freedom: {e}"))
    })?;

    let mut low = 0.0_f64;
    let mut high = df.max(1.0);
    while dist.cdf(high) < p {
        low = high;
        high *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        if dist.cdf(mid) >= p {
            high = mid;
        } else {
            low = mid;
        }
        if high - low <= 1e-12 * high {
            break;
        }
    }
    Ok(0.5 * (low + high))
}

/// Kolmogorov–Smirnov critical value for `n` observations.
///
/// Uses `c(alpha) / (√n + 0.12 + 0.11/√n)` with `c(alpha) = √(−ln(alpha/2)/2)`,
/// which tracks the exact table closely from `n = 1` upward.
pub fn ks_critical(n: usize, alpha: f64) -> Result<f64> {
    check_alpha(alpha)?;
    if n == 0 {
        return Err(Error::invalid("K-S critical value needs n >= 1"));
    }
    let c = (-(alpha / 2.0).ln() / 2.0).sqrt();
    let sqrt_n = (n as f64).sqrt();
    Ok(c / (sqrt_n + 0.12 + 0.11 / sqrt_n))
}

/// Count values into `k` equal-width intervals over `[0, 1)`.
pub fn frequency_bins(data: &[f64], k: usize) -> Vec<u64> {
    let mut bins = vec![0u64; k];
    if k == 0 {
        return bins;
    }
    for &v in data {
        let idx = ((v * k as f64) as usize).min(k - 1);
        bins[idx] += 1;
    }
    bins
}

/// Unbiased sample variance (n − 1 denominator). Zero for fewer than two values.
pub fn sample_variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1) as f64
}

/// Hand formed by the five truncated decimal digits of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PokerHand {
    AllDifferent,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    FullHouse,
    FourOfAKind,
    FiveOfAKind,
}

impl PokerHand {
    pub const ALL: [PokerHand; 7] = [
        PokerHand::AllDifferent,
        PokerHand::OnePair,
        PokerHand::TwoPair,
        PokerHand::ThreeOfAKind,
        PokerHand::FullHouse,
        PokerHand::FourOfAKind,
        PokerHand::FiveOfAKind,
    ];

    /// Probability of the hand for five independent uniform decimal digits.
    pub fn probability(self) -> f64 {
        match self {
            PokerHand::AllDifferent => 0.3024,
            PokerHand::OnePair => 0.504,
            PokerHand::TwoPair => 0.108,
            PokerHand::ThreeOfAKind => 0.072,
            PokerHand::FullHouse => 0.009,
            PokerHand::FourOfAKind => 0.0045,
            PokerHand::FiveOfAKind => 0.0001,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            PokerHand::AllDifferent => "all_different",
            PokerHand::OnePair => "one_pair",
            PokerHand::TwoPair => "two_pair",
            PokerHand::ThreeOfAKind => "three_of_a_kind",
            PokerHand::FullHouse => "full_house",
            PokerHand::FourOfAKind => "four_of_a_kind",
            PokerHand::FiveOfAKind => "five_of_a_kind",
        }
    }

    /// Classify a five-digit group (`1234` is read as `01234`).
    pub fn from_digits(digits: u32) -> PokerHand {
        let mut counts = [0u8; 10];
        let mut d = digits;
        for _ in 0..5 {
            counts[(d % 10) as usize] += 1;
            d /= 10;
        }
        let mut groups: Vec<u8> = counts.into_iter().filter(|&c| c > 0).collect();
        groups.sort_unstable_by(|a, b| b.cmp(a));
        match groups.as_slice() {
            [5] => PokerHand::FiveOfAKind,
            [4, 1] => PokerHand::FourOfAKind,
            [3, 2] => PokerHand::FullHouse,
            [3, 1, 1] => PokerHand::ThreeOfAKind,
            [2, 2, 1] => PokerHand::TwoPair,
            [2, 1, 1, 1] => PokerHand::OnePair,
            _ => PokerHand::AllDifferent,
        }
    }

    /// Classify the truncated digits of a value in `[0, 1)`.
    pub fn of_value(v: f64) -> PokerHand {
        PokerHand::from_digits(truncated_digits(v))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. MEANS TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Means test: the sample mean should be close to 0.5.
///
/// `z = (mean − 0.5) / √(1/(12n))`, approved iff `|z| ≤ z_critical(alpha)`.
pub fn means_test(data: &[f64], alpha: f64) -> Result<TestResult> {
    let name = TestKind::Means.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 1)?;
    let nf = n as f64;

    let mean = data.iter().sum::<f64>() / nf;
    let std_err = (1.0 / (12.0 * nf)).sqrt();
    let z = (mean - 0.5) / std_err;
    let z_crit = z_critical(alpha)?;
    let lower = 0.5 - z_crit * std_err;
    let upper = 0.5 + z_crit * std_err;
    let approved = z.abs() <= z_crit;

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!(
                "mean {mean:.5} vs acceptance interval [{lower:.5}, {upper:.5}] (|z|={:.4})",
                z.abs()
            ),
        ),
        &[
            ("mean", mean),
            ("standard_error", std_err),
            ("z_statistic", z),
            ("z_critical", z_crit),
            ("lower_bound", lower),
            ("upper_bound", upper),
            ("count", nf),
        ],
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. VARIANCE TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Variance test: sample variance against the theoretical 1/12.
///
/// `chi2 = (n−1)·s² / (1/12)` must lie between the two-sided chi-square
/// quantiles with `n − 1` degrees of freedom.
pub fn variance_test(data: &[f64], alpha: f64) -> Result<TestResult> {
    let name = TestKind::Variance.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 2)?;
    let df = (n - 1) as f64;

    let variance = sample_variance(data);
    let chi2 = df * variance * 12.0;
    let chi2_lower = chi2_quantile(df, alpha / 2.0)?;
    let chi2_upper = chi2_quantile(df, 1.0 - alpha / 2.0)?;
    let variance_lower = chi2_lower / (12.0 * df);
    let variance_upper = chi2_upper / (12.0 * df);
    let approved = (chi2_lower..=chi2_upper).contains(&chi2);

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!(
                "variance {:.5} vs acceptance interval [{:.5}, {:.5}] (chi2={chi2:.4}, df={df})",
                variance, variance_lower, variance_upper
            ),
        ),
        &[
            ("variance", variance),
            ("chi2_statistic", chi2),
            ("chi2_lower", chi2_lower),
            ("chi2_upper", chi2_upper),
            ("degrees_of_freedom", df),
            ("variance_lower", variance_lower),
            ("variance_upper", variance_upper),
        ],
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. CHI-SQUARE UNIFORMITY TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Chi-square uniformity test over `k` equal-width intervals.
///
/// Fails with [`Error::InvalidParameter`] if `k < 2` or `k > n`; the latter
/// would leave intervals with an expected frequency below one.
pub fn chi_square_test(data: &[f64], alpha: f64, k: usize) -> Result<TestResult> {
    let name = TestKind::ChiSquare.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 1)?;
    if k < 2 {
        return Err(Error::invalid(format!("{name}: need at least 2 intervals, got k={k}")));
    }
    if k > n {
        return Err(Error::invalid(format!(
            "{name}: k={k} exceeds sample size {n}, expected frequencies would be empty"
        )));
    }

    let observed = frequency_bins(data, k);
    let expected = n as f64 / k as f64;
    let chi2: f64 = observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let df = (k - 1) as f64;
    let chi2_crit = chi2_quantile(df, 1.0 - alpha)?;
    let approved = chi2 <= chi2_crit;

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!("chi2 {chi2:.4} vs critical {chi2_crit:.4} (k={k}, df={df})"),
        ),
        &[
            ("chi2_statistic", chi2),
            ("chi2_critical", chi2_crit),
            ("degrees_of_freedom", df),
            ("intervals", k as f64),
            ("expected_frequency", expected),
        ],
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. KOLMOGOROV-SMIRNOV TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Kolmogorov–Smirnov test against the Uniform(0,1) CDF.
///
/// The decision uses `D = max(D+, D−)` over the order statistics. `k`
/// intervals give the audit-only `interval_max_difference`, the largest gap
/// between observed and expected cumulative frequency at interval edges.
pub fn ks_test(data: &[f64], alpha: f64, k: usize) -> Result<TestResult> {
    let name = TestKind::KolmogorovSmirnov.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 1)?;
    if k < 1 {
        return Err(Error::invalid(format!("{name}: need at least 1 interval, got k={k}")));
    }
    let nf = n as f64;

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let max_diff = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let d_plus = (i + 1) as f64 / nf - x;
            let d_minus = x - i as f64 / nf;
            d_plus.max(d_minus)
        })
        .fold(0.0_f64, f64::max);

    let mut cumulative = 0u64;
    let interval_diff = frequency_bins(data, k)
        .iter()
        .enumerate()
        .map(|(j, &count)| {
            cumulative += count;
            (cumulative as f64 / nf - (j + 1) as f64 / k as f64).abs()
        })
        .fold(0.0_f64, f64::max);

    let critical = ks_critical(n, alpha)?;
    let approved = max_diff <= critical;

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!("D {max_diff:.5} vs critical {critical:.5} (n={n})"),
        ),
        &[
            ("max_difference", max_diff),
            ("critical_value", critical),
            ("count", nf),
            ("intervals", k as f64),
            ("interval_max_difference", interval_diff),
        ],
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 5. POKER TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Poker test: hands formed by each value's five truncated digits, compared
/// with the theoretical hand probabilities (6 degrees of freedom).
pub fn poker_test(data: &[f64], alpha: f64) -> Result<TestResult> {
    let name = TestKind::Poker.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 1)?;
    let nf = n as f64;

    let mut observed: BTreeMap<PokerHand, u64> =
        PokerHand::ALL.iter().map(|&h| (h, 0)).collect();
    for &v in data {
        *observed.entry(PokerHand::of_value(v)).or_default() += 1;
    }

    let chi2: f64 = observed
        .iter()
        .map(|(hand, &o)| {
            let expected = nf * hand.probability();
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let df = (PokerHand::ALL.len() - 1) as f64;
    let chi2_crit = chi2_quantile(df, 1.0 - alpha)?;
    let approved = chi2 <= chi2_crit;

    let observed_keys: Vec<(String, f64)> = observed
        .iter()
        .map(|(hand, &o)| (format!("observed_{}", hand.id()), o as f64))
        .collect();
    let mut stats: Vec<(&str, f64)> = vec![
        ("chi2_statistic", chi2),
        ("chi2_critical", chi2_crit),
        ("degrees_of_freedom", df),
    ];
    stats.extend(observed_keys.iter().map(|(k, v)| (k.as_str(), *v)));

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!("chi2 {chi2:.4} vs critical {chi2_crit:.4} (df={df})"),
        ),
        &stats,
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 6. RUNS UP/DOWN TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Count runs up and down. A step is ascending iff the next value is strictly
/// greater; ties count as descending.
pub fn count_runs(data: &[f64]) -> usize {
    let mut runs = 0usize;
    let mut previous: Option<bool> = None;
    for w in data.windows(2) {
        let up = w[1] > w[0];
        if previous != Some(up) {
            runs += 1;
        }
        previous = Some(up);
    }
    runs
}

/// Runs up/down test. Depends on generation order.
///
/// `mean = (2n−1)/3`, `variance = (16n−29)/90`, approved iff
/// `|z| ≤ z_critical(alpha)`.
pub fn runs_test(data: &[f64], alpha: f64) -> Result<TestResult> {
    let name = TestKind::Runs.display_name();
    check_alpha(alpha)?;
    let n = require_len(name, data, 2)?;
    let nf = n as f64;

    let runs = count_runs(data) as f64;
    let mean = (2.0 * nf - 1.0) / 3.0;
    let variance = (16.0 * nf - 29.0) / 90.0;
    let z = (runs - mean) / variance.sqrt();
    let z_crit = z_critical(alpha)?;
    let approved = z.abs() <= z_crit;

    Ok(TestResult::new(
        name,
        approved,
        decision(
            approved,
            format!("{runs} runs vs expected {mean:.4} (|z|={:.4}, z_crit={z_crit:.4})", z.abs()),
        ),
        &[
            ("runs", runs),
            ("expected_runs", mean),
            ("runs_variance", variance),
            ("z_statistic", z),
            ("z_critical", z_crit),
        ],
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Results of one battery run, keyed and ordered by test.
pub type BatteryResults = BTreeMap<TestKind, TestResult>;

/// Run one test. `bins` is required by the two uniformity tests and ignored
/// by the others.
pub fn run_test(
    kind: TestKind,
    data: &[f64],
    alpha: f64,
    bins: Option<usize>,
) -> Result<TestResult> {
    let require_bins = || {
        bins.ok_or_else(|| Error::invalid(format!("{kind}: interval count k is required")))
    };
    let result = match kind {
        TestKind::Means => means_test(data, alpha)?,
        TestKind::Variance => variance_test(data, alpha)?,
        TestKind::ChiSquare => chi_square_test(data, alpha, require_bins()?)?,
        TestKind::KolmogorovSmirnov => ks_test(data, alpha, require_bins()?)?,
        TestKind::Poker => poker_test(data, alpha)?,
        TestKind::Runs => runs_test(data, alpha)?,
    };
    log::debug!(
        "{}: approved={} {:?}",
        result.test_name,
        result.is_approved,
        result.statistics
    );
    Ok(result)
}

/// Run every enabled test in `config` against `data`.
///
/// The first invalid parameter aborts the run; no partial results are
/// returned.
pub fn run_battery(data: &Sample, config: &TestConfig, alpha: f64) -> Result<BatteryResults> {
    check_alpha(alpha)?;
    let mut results = BatteryResults::new();
    for (kind, setting) in config.enabled() {
        results.insert(kind, run_test(kind, data.values(), alpha, setting.bins())?);
    }
    let verdict = BatteryVerdict::from_results(&results);
    log::info!(
        "battery: {}/{} tests approved (alpha={alpha}, n={})",
        verdict.approved,
        verdict.total,
        data.len()
    );
    Ok(results)
}

/// Approved vs executed test counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryVerdict {
    pub approved: usize,
    pub total: usize,
}

impl BatteryVerdict {
    pub fn from_results(results: &BatteryResults) -> Self {
        Self {
            approved: results.values().filter(|r| r.is_approved).count(),
            total: results.len(),
        }
    }

    /// True when every executed test was approved. Vacuously true when no
    /// test ran; check [`BatteryVerdict::is_empty`] first.
    pub fn all_approved(&self) -> bool {
        self.approved == self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn rejected(&self) -> usize {
        self.total - self.approved
    }
}

/// Serializable summary of a battery run, shared by the CLI and the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryReport {
    pub alpha: f64,
    pub approved: usize,
    pub total: usize,
    pub all_approved: bool,
    pub results: BatteryResults,
}

impl BatteryReport {
    pub fn new(alpha: f64, results: BatteryResults) -> Self {
        let verdict = BatteryVerdict::from_results(&results);
        Self {
            alpha,
            approved: verdict.approved,
            total: verdict.total,
            all_approved: verdict.all_approved(),
            results,
        }
    }

    pub fn verdict(&self) -> BatteryVerdict {
        BatteryVerdict {
            approved: self.approved,
            total: self.total,
        }
    }
}
