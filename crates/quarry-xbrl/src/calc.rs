//! Derived calculations over data-point series.
//!
//! All calculations read an ordered series and never mutate it. A value that
//! cannot be computed meaningfully (zero base, sign flip, non-positive CAGR
//! endpoint) is absent, not an error.

use crate::catalog::{RatioDefinition, RatioFormat, RatioOperation};
use crate::fact::DataPoint;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// CAGR lookbacks computed when the series is long enough.
const CAGR_LOOKBACKS: [usize; 4] = [1, 3, 5, 10];

/// Half-width of the growth-signal dead band, in percentage points. Changes
/// in mean growth smaller than this read as noise, not a trend change.
const GROWTH_SIGNAL_BAND: f64 = 2.0;

/// Year-over-year change for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YoyEntry {
    /// The later year of the pair.
    pub fiscal_year: i32,
    /// Signed percent change, one decimal. Absent on a zero base or a sign
    /// flip, where a percentage is not meaningful.
    pub change_percent: Option<f64>,
}

/// Compound annual growth over one lookback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CagrEntry {
    /// Lookback length in periods.
    pub lookback_years: usize,
    /// Signed percent. Absent when either endpoint is non-positive.
    pub percent: Option<f64>,
}

/// Whether growth is speeding up or slowing down across the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthSignal {
    /// Second-half mean growth exceeds first-half by more than the band.
    Accelerating,
    /// Second-half mean growth trails first-half by more than the band.
    Decelerating,
    /// Inside the band.
    Stable,
}

/// All derived calculations for one series.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesCalculations {
    /// Year-over-year changes for consecutive fiscal years.
    pub yoy_changes: Vec<YoyEntry>,
    /// CAGR per lookback, emitted when the series has more entries than the
    /// lookback.
    pub cagr: Vec<CagrEntry>,
    /// Growth acceleration signal, when enough usable entries exist.
    pub growth_signal: Option<GrowthSignal>,
}

/// Signed YoY percent change, rounded to one decimal.
///
/// Absent when the base is zero, or when the signs differ (loss to profit or
/// back); a percent across a sign flip carries no meaning.
pub fn yoy_percent(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 || sign(prev) != sign(curr) {
        return None;
    }
    let change = (curr - prev) / prev.abs();
    Some((change * 1000.0).round() / 10.0)
}

/// Compound annual growth rate as a signed percent, unrounded.
///
/// Absent for a zero lookback or non-positive endpoints, where the geometric
/// mean is undefined.
pub fn cagr_percent(start: f64, end: f64, years: usize) -> Option<f64> {
    if years == 0 || start <= 0.0 || end <= 0.0 {
        return None;
    }
    Some(((end / start).powf(1.0 / years as f64) - 1.0) * 100.0)
}

/// Computes YoY, multi-period CAGR, and the growth signal for an annual
/// series in chronological order. Quarterly series get an empty result;
/// their periods are not year-comparable here.
pub fn calculate_series(points: &[DataPoint]) -> SeriesCalculations {
    if points.is_empty() || points.iter().any(|p| p.fiscal_period.is_quarter()) {
        return SeriesCalculations::default();
    }

    let mut yoy_changes = Vec::new();
    for pair in points.windows(2) {
        if pair[1].fiscal_year == pair[0].fiscal_year + 1 {
            yoy_changes.push(YoyEntry {
                fiscal_year: pair[1].fiscal_year,
                change_percent: yoy_percent(pair[0].value, pair[1].value),
            });
        }
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let cagr = CAGR_LOOKBACKS
        .iter()
        .filter(|&&lookback| values.len() > lookback)
        .map(|&lookback| CagrEntry {
            lookback_years: lookback,
            percent: cagr_percent(
                values[values.len() - 1 - lookback],
                values[values.len() - 1],
                lookback,
            ),
        })
        .collect();

    SeriesCalculations {
        yoy_changes,
        cagr,
        growth_signal: growth_signal(&values),
    }
}

/// Compares mean growth between the first and second half of the series.
///
/// Growth samples come from consecutive pairs where both values are
/// positive. At least four usable entries and two samples are required.
pub fn growth_signal(values: &[f64]) -> Option<GrowthSignal> {
    let usable = values.iter().filter(|&&v| v > 0.0).count();
    if usable < 4 {
        return None;
    }

    let growths: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] > 0.0 && pair[1] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0] * 100.0)
        .collect();
    if growths.len() < 2 {
        return None;
    }

    let mid = growths.len() / 2;
    let first = mean(&growths[..mid]);
    let second = mean(&growths[mid..]);

    if second > first + GROWTH_SIGNAL_BAND {
        Some(GrowthSignal::Accelerating)
    } else if second < first - GROWTH_SIGNAL_BAND {
        Some(GrowthSignal::Decelerating)
    } else {
        Some(GrowthSignal::Stable)
    }
}

/// One composed ratio value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioPoint {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Formatted value per the ratio's format.
    pub value: f64,
}

/// A composed ratio series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioSeries {
    /// Values in fiscal-year ascending order.
    pub points: Vec<RatioPoint>,
    /// Years skipped because the denominator was zero.
    pub div_by_zero_count: usize,
}

/// Why a ratio produced no data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RatioComposeError {
    /// Numerator and denominator share no fiscal years.
    #[error("no overlapping fiscal years between numerator and denominator")]
    NoOverlap,
    /// Every overlapping year had a zero denominator.
    #[error("denominator was zero in all {div_by_zero_count} overlapping fiscal years")]
    AllDivByZero {
        /// Number of years skipped.
        div_by_zero_count: usize,
    },
}

/// Composes a ratio over the intersection of fiscal years.
pub fn compose_ratio(
    numerator: &[DataPoint],
    denominator: &[DataPoint],
    ratio: &RatioDefinition,
) -> Result<RatioSeries, RatioComposeError> {
    let numerator_by_year: BTreeMap<i32, f64> =
        numerator.iter().map(|p| (p.fiscal_year, p.value)).collect();
    let denominator_by_year: BTreeMap<i32, f64> = denominator
        .iter()
        .map(|p| (p.fiscal_year, p.value))
        .collect();

    let mut points = Vec::new();
    let mut div_by_zero_count = 0;
    let mut overlap = 0;

    for (&year, &num) in &numerator_by_year {
        let Some(&den) = denominator_by_year.get(&year) else {
            continue;
        };
        overlap += 1;

        let value = match ratio.operation {
            RatioOperation::Subtract => num - den,
            RatioOperation::Divide => {
                if den == 0.0 {
                    div_by_zero_count += 1;
                    continue;
                }
                num / den
            }
        };

        points.push(RatioPoint {
            fiscal_year: year,
            value: format_ratio_value(value, ratio.format),
        });
    }

    if overlap == 0 {
        return Err(RatioComposeError::NoOverlap);
    }
    if points.is_empty() {
        return Err(RatioComposeError::AllDivByZero { div_by_zero_count });
    }

    Ok(RatioSeries {
        points,
        div_by_zero_count,
    })
}

/// Format-driven rounding: percentages to one decimal, multiples to two,
/// currency untouched. The exact round(v*1000)/10 and round(v*100)/100
/// conventions are relied on by downstream renderers.
fn format_ratio_value(value: f64, format: RatioFormat) -> f64 {
    match format {
        RatioFormat::Percentage => (value * 1000.0).round() / 10.0,
        RatioFormat::Multiple => (value * 100.0).round() / 100.0,
        RatioFormat::Currency => value,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
