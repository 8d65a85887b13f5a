//! Statistical tests backing the default drift evaluator

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Two-sample Kolmogorov-Smirnov test
///
/// Returns `(statistic, p_value)`. Either sample being empty yields `(0, 1)`.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> (f64, f64) {
    if reference.is_empty() || current.is_empty() {
        return (0.0, 1.0);
    }

    let mut a = reference.to_vec();
    let mut b = current.to_vec();
    a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let (mut i, mut j) = (0usize, 0usize);
    let mut d_max = 0.0f64;

    // Walk the merged sample; ties advance both ECDFs before comparing
    while i < a.len() && j < b.len() {
        let x = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d_max = d_max.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    let n_eff = (n1 * n2) / (n1 + n2);
    let sqrt_n = n_eff.sqrt();
    // Stephens' small-sample correction
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d_max;
    (d_max, ks_p_value(lambda))
}

/// Asymptotic Kolmogorov distribution tail probability
pub fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Chi-square goodness of fit of current category counts against reference proportions
///
/// Reference counts get a pseudo-count of one per category so categories never
/// seen in the reference still contribute. Returns `(statistic, p_value)`.
pub fn chi_square_goodness_of_fit(
    reference: &HashMap<String, usize>,
    current: &HashMap<String, usize>,
) -> (f64, f64) {
    let categories: BTreeSet<&String> = reference.keys().chain(current.keys()).collect();
    let total_current: usize = current.values().sum();
    let total_reference: usize = reference.values().sum();

    if categories.len() < 2 || total_current == 0 || total_reference == 0 {
        return (0.0, 1.0);
    }

    let smoothed_total = (total_reference + categories.len()) as f64;
    let mut chi_sq = 0.0;
    for category in &categories {
        let observed = *current.get(*category).unwrap_or(&0) as f64;
        let proportion = (*reference.get(*category).unwrap_or(&0) + 1) as f64 / smoothed_total;
        let expected = proportion * total_current as f64;
        chi_sq += (observed - expected).powi(2) / expected;
    }

    (chi_sq, chi_square_p_value(chi_sq, categories.len() - 1))
}

/// Upper-tail chi-square p-value via the Wilson-Hilferty approximation
pub fn chi_square_p_value(chi_sq: f64, df: usize) -> f64 {
    if df == 0 || chi_sq <= 0.0 {
        return 1.0;
    }
    let k = df as f64;
    let z = ((chi_sq / k).powf(1.0 / 3.0) - (1.0 - 2.0 / (9.0 * k))) / (2.0 / (9.0 * k)).sqrt();
    (0.5 * (1.0 - erf(z / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

/// Abramowitz-Stegun error function approximation
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_ks_identical_samples() {
        let sample: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let (d, p) = ks_two_sample(&sample, &sample);
        assert_eq!(d, 0.0);
        assert!(p > 0.99);
    }

    #[test]
    fn test_ks_shifted_samples() {
        let reference: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let current: Vec<f64> = (0..200).map(|i| i as f64 + 150.0).collect();
        let (d, p) = ks_two_sample(&reference, &current);
        assert!(d > 0.7);
        assert!(p < 0.001);
    }

    #[test]
    fn test_ks_handles_ties() {
        let reference = vec![1.0; 50];
        let current = vec![1.0; 10];
        let (d, _) = ks_two_sample(&reference, &current);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_ks_empty_sample() {
        assert_eq!(ks_two_sample(&[], &[1.0]), (0.0, 1.0));
    }

    #[test]
    fn test_chi_square_same_distribution() {
        let reference = counts(&[("No", 900), ("Yes", 100)]);
        let current = counts(&[("No", 90), ("Yes", 10)]);
        let (_, p) = chi_square_goodness_of_fit(&reference, &current);
        assert!(p > 0.5);
    }

    #[test]
    fn test_chi_square_shifted_distribution() {
        let reference = counts(&[("No", 900), ("Yes", 100)]);
        let current = counts(&[("No", 10), ("Yes", 90)]);
        let (_, p) = chi_square_goodness_of_fit(&reference, &current);
        assert!(p < 0.001);
    }

    #[test]
    fn test_chi_square_single_category() {
        let reference = counts(&[("CA", 10)]);
        let current = counts(&[("CA", 3)]);
        assert_eq!(chi_square_goodness_of_fit(&reference, &current), (0.0, 1.0));
    }

    #[test]
    fn test_erf_bounds() {
        assert!((erf(0.0)).abs() < 1e-6);
        assert!((erf(3.0) - 1.0).abs() < 1e-4);
        assert!((erf(-3.0) + 1.0).abs() < 1e-4);
    }
}
