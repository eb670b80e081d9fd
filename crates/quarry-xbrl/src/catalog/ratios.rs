//! Derived ratio definitions.

/// Output format of a composed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioFormat {
    /// Quotient scaled to percent, one decimal.
    Percentage,
    /// Quotient as a multiple, two decimals.
    Multiple,
    /// Unscaled monetary amount.
    Currency,
}

/// How the two operands combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioOperation {
    /// numerator / denominator.
    Divide,
    /// numerator - denominator (free cash flow).
    Subtract,
}

/// A derived ratio over two catalog metrics.
#[derive(Debug, Clone, Copy)]
pub struct RatioDefinition {
    /// Stable identifier, e.g. "net_margin".
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Numerator metric id.
    pub numerator: &'static str,
    /// Denominator metric id (subtrahend for subtract).
    pub denominator: &'static str,
    /// Output format.
    pub format: RatioFormat,
    /// Combining operation.
    pub operation: RatioOperation,
}

const fn divide(
    id: &'static str,
    display_name: &'static str,
    numerator: &'static str,
    denominator: &'static str,
    format: RatioFormat,
) -> RatioDefinition {
    RatioDefinition {
        id,
        display_name,
        numerator,
        denominator,
        format,
        operation: RatioOperation::Divide,
    }
}

/// The nine derived ratios the summary reports.
static RATIOS: &[RatioDefinition] = &[
    divide("net_margin", "Net Margin", "net_income", "revenue", RatioFormat::Percentage),
    divide("gross_margin", "Gross Margin", "gross_profit", "revenue", RatioFormat::Percentage),
    divide(
        "operating_margin",
        "Operating Margin",
        "operating_income",
        "revenue",
        RatioFormat::Percentage,
    ),
    RatioDefinition {
        id: "free_cash_flow",
        display_name: "Free Cash Flow",
        numerator: "operating_cash_flow",
        denominator: "capital_expenditures",
        format: RatioFormat::Currency,
        operation: RatioOperation::Subtract,
    },
    divide(
        "debt_to_equity",
        "Debt to Equity",
        "total_liabilities",
        "stockholders_equity",
        RatioFormat::Multiple,
    ),
    divide(
        "current_ratio",
        "Current Ratio",
        "current_assets",
        "current_liabilities",
        RatioFormat::Multiple,
    ),
    divide("roa", "Return on Assets", "net_income", "total_assets", RatioFormat::Percentage),
    divide("roe", "Return on Equity", "net_income", "stockholders_equity", RatioFormat::Percentage),
    divide(
        "interest_coverage",
        "Interest Coverage",
        "operating_income",
        "interest_expense",
        RatioFormat::Multiple,
    ),
];

/// All catalog ratios.
pub fn ratios() -> &'static [RatioDefinition] {
    RATIOS
}

/// Looks up a ratio by id.
pub fn ratio_by_id(id: &str) -> Option<&'static RatioDefinition> {
    RATIOS.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_ratios() {
        assert_eq!(ratios().len(), 9);
    }

    #[test]
    fn test_fcf_is_subtraction() {
        let fcf = ratio_by_id("free_cash_flow").unwrap();
        assert_eq!(fcf.operation, RatioOperation::Subtract);
        assert_eq!(fcf.format, RatioFormat::Currency);
    }
}
