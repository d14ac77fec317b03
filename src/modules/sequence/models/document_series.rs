use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Business document series that receive sequential codes
///
/// Codes look like `SAL-202507-0001`: series prefix, month period key and a
/// zero-padded counter scoped to that (series, period) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSeries {
    Quotation,
    Sale,
    DeliveryGuide,
}

impl DocumentSeries {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Quotation => "QUO",
            Self::Sale => "SAL",
            Self::DeliveryGuide => "DEL",
        }
    }

    /// Table holding this series' codes (used by the scan allocator)
    pub fn table(&self) -> &'static str {
        match self {
            Self::Quotation => "quotations",
            Self::Sale => "sales",
            Self::DeliveryGuide => "delivery_guides",
        }
    }

    /// Month-scoped period key, e.g. `202507`
    pub fn period_key(date: NaiveDate) -> String {
        format!("{:04}{:02}", date.year(), date.month())
    }

    /// Code prefix shared by every document of one series in one period,
    /// e.g. `SAL-202507-`
    pub fn code_prefix(&self, date: NaiveDate) -> String {
        format!("{}-{}-", self.prefix(), Self::period_key(date))
    }

    /// Full code for a counter value; padding widens past 9999
    pub fn format_code(&self, date: NaiveDate, value: u32) -> String {
        format!("{}{:04}", self.code_prefix(date), value)
    }

    /// Numeric suffix of a code belonging to this series and period,
    /// `None` when the code is from another scope or malformed
    pub fn parse_suffix(&self, code: &str, date: NaiveDate) -> Option<u32> {
        let prefix = self.code_prefix(date);
        code.strip_prefix(&prefix)?.parse().ok()
    }
}

impl std::fmt::Display for DocumentSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
