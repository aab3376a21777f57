//! Display-only currency conversion
//!
//! All computation happens in BRL. Conversion to USD is applied to finished
//! numbers when they are shown or exported.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Default exchange rate (BRL per USD)
pub const DEFAULT_EXCHANGE_RATE: f64 = 5.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Brazilian real (canonical)
    #[default]
    Brl,
    /// US dollar
    Usd,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Brl => "R$",
            Currency::Usd => "US$",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
        }
    }
}

/// Currency chosen for presentation plus the rate used to get there
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDisplay {
    pub currency: Currency,
    /// BRL per USD; ignored for BRL display
    pub exchange_rate: f64,
}

impl CurrencyDisplay {
    pub fn brl() -> Self {
        Self {
            currency: Currency::Brl,
            exchange_rate: 1.0,
        }
    }

    pub fn usd(exchange_rate: f64) -> Result<Self> {
        if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
            return Err(SimulationError::invalid(
                "exchange_rate",
                format!("must be a positive number, got {}", exchange_rate),
            ));
        }
        Ok(Self {
            currency: Currency::Usd,
            exchange_rate,
        })
    }

    pub fn new(currency: Currency, exchange_rate: f64) -> Result<Self> {
        match currency {
            Currency::Brl => Ok(Self::brl()),
            Currency::Usd => Self::usd(exchange_rate),
        }
    }

    /// Convert a BRL amount to the display currency
    pub fn convert(&self, brl: f64) -> f64 {
        match self.currency {
            Currency::Brl => brl,
            Currency::Usd => brl / self.exchange_rate,
        }
    }

    /// Convert a display-currency amount back to BRL
    pub fn to_canonical(&self, amount: f64) -> f64 {
        match self.currency {
            Currency::Brl => amount,
            Currency::Usd => amount * self.exchange_rate,
        }
    }

    /// Format a BRL amount as e.g. `R$ 1,234.56` or `US$ 224.47`
    pub fn format(&self, brl: f64) -> String {
        format!("{} {}", self.currency.symbol(), group_thousands(self.convert(brl)))
    }
}

impl Default for CurrencyDisplay {
    fn default() -> Self {
        Self::brl()
    }
}

/// Two decimals with comma thousands separators
fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
