//! Goal combiner
//!
//! Normalizes each KPI across a comparison population (one value per
//! configuration) and averages paired KPIs into three composite goals
//! plus their sum. Degenerate populations are reported as analysis
//! errors, never silently zeroed.

use serde::Serialize;

use crate::domain::AnalysisError;

use super::kpi::KpiReport;
use super::stats::{mean, population_std};

/// Z-score normalize one KPI across the population
///
/// Undefined for fewer than two values or zero variance.
pub fn z_scores(values: &[f64], kpi: &'static str) -> Result<Vec<f64>, AnalysisError> {
    if values.len() < 2 {
        return Err(AnalysisError::PopulationTooSmall { len: values.len() });
    }

    let m = mean(values);
    let std = population_std(values);
    if std == 0.0 {
        return Err(AnalysisError::ZeroVariance { kpi });
    }

    Ok(values.iter().map(|x| (x - m) / std).collect())
}

/// Composite goal scores, one entry per population member
#[derive(Debug, Clone, Serialize)]
pub struct GoalScores {
    /// avg(norm price volatility, norm price integral error)
    pub price_reliability: Vec<f64>,
    /// avg(norm slippage magnitude, norm slippage volatility)
    pub trade_xp: Vec<f64>,
    /// avg(norm immediate yield, norm integral yield)
    pub provider_xp: Vec<f64>,
    /// Sum of the three goals
    pub combined: Vec<f64>,
}

fn paired_average(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect()
}

/// Normalize and combine a population of KPI reports
pub fn goal_scores(population: &[KpiReport]) -> Result<GoalScores, AnalysisError> {
    let column = |f: fn(&KpiReport) -> f64| -> Vec<f64> { population.iter().map(f).collect() };

    let price_volatility = z_scores(&column(|k| k.price_volatility), "price_volatility")?;
    let price_integral_error = z_scores(
        &column(|k| k.price_integral_error),
        "price_integral_error",
    )?;
    let slippage_magnitude = z_scores(&column(|k| k.slippage_magnitude), "slippage_magnitude")?;
    let slippage_volatility = z_scores(&column(|k| k.slippage_volatility), "slippage_volatility")?;
    let immediate_yield = z_scores(&column(|k| k.immediate_yield), "immediate_yield")?;
    let integral_yield = z_scores(&column(|k| k.integral_yield), "integral_yield")?;

    let price_reliability = paired_average(&price_volatility, &price_integral_error);
    let trade_xp = paired_average(&slippage_magnitude, &slippage_volatility);
    let provider_xp = paired_average(&immediate_yield, &integral_yield);

    let combined = price_reliability
        .iter()
        .zip(&trade_xp)
        .zip(&provider_xp)
        .map(|((p, t), l)| p + t + l)
        .collect();

    Ok(GoalScores {
        price_reliability,
        trade_xp,
        provider_xp,
        combined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn report(seed: f64) -> KpiReport {
        KpiReport {
            price_volatility: 0.01 * seed,
            price_integral_error: 0.02 * seed,
            slippage_magnitude: 0.1 + 0.01 * seed,
            slippage_volatility: 0.005 * seed,
            immediate_yield: 0.0001 * seed,
            integral_yield: 0.01 * seed,
        }
    }

    #[test]
    fn test_z_scores_center_and_scale() {
        let scores = z_scores(&[4.0, 6.0], "price_volatility").unwrap();
        assert_relative_eq!(scores[0], -1.0);
        assert_relative_eq!(scores[1], 1.0);
        assert_relative_eq!(scores.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_z_scores_population_too_small() {
        let err = z_scores(&[1.0], "price_volatility").unwrap_err();
        assert_eq!(err, AnalysisError::PopulationTooSmall { len: 1 });
    }

    #[test]
    fn test_z_scores_zero_variance() {
        let err = z_scores(&[3.0, 3.0, 3.0], "integral_yield").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ZeroVariance {
                kpi: "integral_yield"
            }
        );
    }

    #[test]
    fn test_combined_is_exact_sum_of_goals() {
        let population: Vec<KpiReport> = (1..=5).map(|i| report(i as f64)).collect();
        let goals = goal_scores(&population).unwrap();

        for i in 0..population.len() {
            assert_eq!(
                goals.combined[i],
                goals.price_reliability[i] + goals.trade_xp[i] + goals.provider_xp[i]
            );
        }
    }

    #[test]
    fn test_goal_population_shape() {
        let population: Vec<KpiReport> = (1..=4).map(|i| report(i as f64)).collect();
        let goals = goal_scores(&population).unwrap();

        assert_eq!(goals.price_reliability.len(), 4);
        assert_eq!(goals.trade_xp.len(), 4);
        assert_eq!(goals.provider_xp.len(), 4);
        assert_eq!(goals.combined.len(), 4);

        // Normalized pairs average to zero-mean columns
        assert_relative_eq!(
            goals.price_reliability.iter().sum::<f64>(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_degenerate_population_propagates_kpi_name() {
        let mut population: Vec<KpiReport> = (1..=3).map(|i| report(i as f64)).collect();
        for k in &mut population {
            k.slippage_volatility = 0.42;
        }

        let err = goal_scores(&population).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ZeroVariance {
                kpi: "slippage_volatility"
            }
        );
    }
}
