//! Metric definitions.

/// Which financial statement a metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementType {
    /// Income statement.
    IncomeStatement,
    /// Cash flow statement.
    CashFlow,
    /// Balance sheet.
    BalanceSheet,
}

/// Unit family of a metric's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Monetary amounts, reported under the "USD" unit.
    Currency,
    /// Share counts, reported under the "shares" unit.
    Shares,
    /// Dimensionless values; the metric names its own unit code.
    Ratio,
}

/// How a metric's values relate to their reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Flows summed over the period (income statement, cash flow).
    Sum,
    /// Point-in-time snapshot at period end (balance sheet).
    EndOfPeriod,
    /// Period average. No catalog metric uses this yet.
    Average,
}

/// One candidate XBRL tag for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XbrlConcept {
    /// Taxonomy the tag lives in ("us-gaap", "dei", ...).
    pub taxonomy: &'static str,
    /// Tag name.
    pub concept: &'static str,
    /// Preference rank, 1 = most preferred. Unique within a metric.
    pub priority: u8,
    /// First fiscal year this tag is considered valid, when bounded.
    pub valid_from: Option<i32>,
    /// Last fiscal year this tag is considered valid, when bounded.
    pub valid_through: Option<i32>,
}

impl XbrlConcept {
    /// Qualified "taxonomy:Concept" form used in provenance.
    pub fn qualified(&self) -> String {
        format!("{}:{}", self.taxonomy, self.concept)
    }

    /// True when `fiscal_year` falls inside the validity window.
    pub fn valid_for(&self, fiscal_year: i32) -> bool {
        self.valid_from.is_none_or(|from| fiscal_year >= from)
            && self.valid_through.is_none_or(|through| fiscal_year <= through)
    }
}

/// A metric the engine can resolve.
#[derive(Debug, Clone, Copy)]
pub struct MetricDefinition {
    /// Stable identifier, e.g. "revenue".
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Statement the metric comes from.
    pub statement: StatementType,
    /// Unit family.
    pub unit_type: UnitType,
    /// Period aggregation.
    pub aggregation: Aggregation,
    /// Unit code override for [`UnitType::Ratio`] metrics.
    pub custom_unit: Option<&'static str>,
    /// Candidate tags in priority order.
    pub concepts: &'static [XbrlConcept],
}

impl MetricDefinition {
    /// The unit key to look up in the company-facts bundle.
    pub const fn unit_code(&self) -> &'static str {
        match self.unit_type {
            UnitType::Currency => "USD",
            UnitType::Shares => "shares",
            UnitType::Ratio => match self.custom_unit {
                Some(unit) => unit,
                None => "pure",
            },
        }
    }
}

const fn gaap(concept: &'static str, priority: u8) -> XbrlConcept {
    XbrlConcept {
        taxonomy: "us-gaap",
        concept,
        priority,
        valid_from: None,
        valid_through: None,
    }
}

const fn dei(concept: &'static str, priority: u8) -> XbrlConcept {
    XbrlConcept {
        taxonomy: "dei",
        concept,
        priority,
        valid_from: None,
        valid_through: None,
    }
}

/// The full metric catalog. Built once, read-only thereafter.
static METRICS: &[MetricDefinition] = &[
    MetricDefinition {
        id: "revenue",
        display_name: "Revenue",
        description: "Total revenue from contracts with customers",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("Revenues", 1),
            gaap("RevenueFromContractWithCustomerExcludingAssessedTax", 2),
            gaap("SalesRevenueNet", 3),
            gaap("RevenueFromContractWithCustomerIncludingAssessedTax", 4),
        ],
    },
    MetricDefinition {
        id: "net_income",
        display_name: "Net Income",
        description: "Net income or loss attributable to the company",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("NetIncomeLoss", 1),
            gaap("ProfitLoss", 2),
            gaap("NetIncomeLossAvailableToCommonStockholdersBasic", 3),
        ],
    },
    MetricDefinition {
        id: "gross_profit",
        display_name: "Gross Profit",
        description: "Revenue less cost of revenue",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[gaap("GrossProfit", 1)],
    },
    MetricDefinition {
        id: "operating_income",
        display_name: "Operating Income",
        description: "Income from operations before interest and taxes",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("OperatingIncomeLoss", 1),
            gaap(
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
                2,
            ),
        ],
    },
    MetricDefinition {
        id: "interest_expense",
        display_name: "Interest Expense",
        description: "Interest expense on borrowings",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("InterestExpense", 1),
            gaap("InterestExpenseNonoperating", 2),
        ],
    },
    MetricDefinition {
        id: "research_development",
        display_name: "Research & Development",
        description: "Research and development expense",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[gaap("ResearchAndDevelopmentExpense", 1)],
    },
    MetricDefinition {
        id: "eps_diluted",
        display_name: "EPS (Diluted)",
        description: "Diluted earnings per share",
        statement: StatementType::IncomeStatement,
        unit_type: UnitType::Ratio,
        aggregation: Aggregation::Sum,
        custom_unit: Some("USD/shares"),
        concepts: &[
            gaap("EarningsPerShareDiluted", 1),
            gaap("EarningsPerShareBasic", 2),
        ],
    },
    MetricDefinition {
        id: "operating_cash_flow",
        display_name: "Operating Cash Flow",
        description: "Net cash provided by operating activities",
        statement: StatementType::CashFlow,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("NetCashProvidedByUsedInOperatingActivities", 1),
            gaap("NetCashProvidedByUsedInOperatingActivitiesContinuingOperations", 2),
        ],
    },
    MetricDefinition {
        id: "capital_expenditures",
        display_name: "Capital Expenditures",
        description: "Payments to acquire property, plant, and equipment",
        statement: StatementType::CashFlow,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::Sum,
        custom_unit: None,
        concepts: &[
            gaap("PaymentsToAcquirePropertyPlantAndEquipment", 1),
            gaap("PaymentsForCapitalImprovements", 2),
        ],
    },
    MetricDefinition {
        id: "total_assets",
        display_name: "Total Assets",
        description: "Total assets at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[gaap("Assets", 1)],
    },
    MetricDefinition {
        id: "total_liabilities",
        display_name: "Total Liabilities",
        description: "Total liabilities at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[gaap("Liabilities", 1)],
    },
    MetricDefinition {
        id: "stockholders_equity",
        display_name: "Stockholders' Equity",
        description: "Total stockholders' equity at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[
            gaap("StockholdersEquity", 1),
            gaap(
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
                2,
            ),
        ],
    },
    MetricDefinition {
        id: "current_assets",
        display_name: "Current Assets",
        description: "Assets expected to convert to cash within a year",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[gaap("AssetsCurrent", 1)],
    },
    MetricDefinition {
        id: "current_liabilities",
        display_name: "Current Liabilities",
        description: "Obligations due within a year",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[gaap("LiabilitiesCurrent", 1)],
    },
    MetricDefinition {
        id: "long_term_debt",
        display_name: "Long-Term Debt",
        description: "Long-term borrowings at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[
            gaap("LongTermDebt", 1),
            gaap("LongTermDebtNoncurrent", 2),
            gaap("LongTermDebtAndCapitalLeaseObligations", 3),
        ],
    },
    MetricDefinition {
        id: "cash_and_equivalents",
        display_name: "Cash & Equivalents",
        description: "Cash and cash equivalents at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Currency,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[
            gaap("CashAndCashEquivalentsAtCarryingValue", 1),
            gaap(
                "CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
                2,
            ),
        ],
    },
    MetricDefinition {
        id: "shares_outstanding",
        display_name: "Shares Outstanding",
        description: "Common shares outstanding at period end",
        statement: StatementType::BalanceSheet,
        unit_type: UnitType::Shares,
        aggregation: Aggregation::EndOfPeriod,
        custom_unit: None,
        concepts: &[
            gaap("CommonStockSharesOutstanding", 1),
            dei("EntityCommonStockSharesOutstanding", 2),
        ],
    },
];

/// All catalog metrics.
pub fn metrics() -> &'static [MetricDefinition] {
    METRICS
}

/// Looks up a metric by id.
pub fn metric_by_id(id: &str) -> Option<&'static MetricDefinition> {
    METRICS.iter().find(|m| m.id == id)
}
