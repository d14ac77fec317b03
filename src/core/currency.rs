use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// A currency row with its precision and formatting rules
///
/// Documents carry a `currency_code` and an `exchange_rate` snapshot; the
/// currency itself decides how many decimal places survive rounding and how
/// amounts are rendered. Internal arithmetic always runs at full precision,
/// rounding happens once per figure via [`Currency::round`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Currency {
    /// ISO-style code, e.g. "USD", "CLP"
    pub code: String,
    pub symbol: String,
    /// Decimal places kept when persisting/displaying amounts
    pub decimal_places: u32,
    pub decimal_separator: String,
    pub thousand_separator: String,
    /// Rate against the system base currency, must be > 0
    pub exchange_rate: Decimal,
    /// At most one currency row may be the default
    pub is_default: bool,
}

impl Currency {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>, decimal_places: u32) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            decimal_places,
            decimal_separator: ".".to_string(),
            thousand_separator: ",".to_string(),
            exchange_rate: Decimal::ONE,
            is_default: false,
        }
    }

    /// Rounds a full-precision amount to this currency's decimal places
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.decimal_places)
    }

    /// Validates that a persisted amount does not carry more precision than
    /// this currency allows
    pub fn validate_amount(&self, amount: Decimal) -> Result<()> {
        if amount.scale() > self.decimal_places {
            return Err(AppError::validation(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self.code,
                self.decimal_places,
                amount.scale()
            )));
        }
        Ok(())
    }

    /// Validates the currency row itself (exchange rate must be positive)
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::validation("Currency code cannot be empty"));
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Exchange rate must be positive, got {}",
                self.exchange_rate
            )));
        }
        Ok(())
    }

    /// The active default cannot be removed; another default must be set
    /// first
    pub fn guard_removal(&self) -> Result<()> {
        if self.is_default {
            return Err(AppError::state(
                "Cannot remove the default currency; set another default first",
            ));
        }
        Ok(())
    }

    /// Formats an amount with this currency's separators, e.g. `$ 1,234.50`
    pub fn format_amount(&self, amount: Decimal) -> String {
        let rounded = self.round(amount);
        let negative = rounded.is_sign_negative();
        let as_text = rounded.abs().to_string();

        let (integer_part, fraction_part) = match as_text.split_once('.') {
            Some((int, frac)) => (int.to_string(), frac.to_string()),
            None => (as_text, String::new()),
        };

        // Group the integer digits in threes from the right
        let mut grouped = String::new();
        for (i, ch) in integer_part.chars().enumerate() {
            if i > 0 && (integer_part.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousand_separator);
            }
            grouped.push(ch);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push(' ');
        out.push_str(&grouped);
        if self.decimal_places > 0 {
            let mut fraction = fraction_part;
            while (fraction.len() as u32) < self.decimal_places {
                fraction.push('0');
            }
            out.push_str(&self.decimal_separator);
            out.push_str(&fraction);
        }
        out
    }
}
