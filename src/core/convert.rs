//! Amount conversion over a rate snapshot.

use crate::core::error::ConvertError;
use crate::core::rates::RateSnapshot;
use std::fmt::Display;

/// Which arithmetic produced a [`Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
    /// The table is based on the source currency: `rate = rates[to]`.
    Direct,
    /// The table has another base: `rate = rates[to] / rates[from]`.
    CrossBase,
}

impl Display for ConversionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionPath::Direct => write!(f, "direct"),
            ConversionPath::CrossBase => write!(f, "cross-base"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub result: f64,
    pub rate: f64,
    pub path: ConversionPath,
}

impl Conversion {
    /// Cross-base results derive the rate from two quotes of a table with a
    /// different base and may not match a direct quote.
    pub fn is_approximate(&self) -> bool {
        self.path == ConversionPath::CrossBase
    }
}

fn rate_for(snapshot: &RateSnapshot, code: &str) -> Result<f64, ConvertError> {
    snapshot
        .rates
        .get(code)
        .copied()
        .ok_or_else(|| ConvertError::UnknownCurrency(code.to_string()))
}

/// Converts `amount` of `from` into `to`.
///
/// No rounding is applied. When the table base is unknown (empty
/// `base_code`), a `from` quoted at exactly 1.0 is taken as the base.
pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    snapshot: &RateSnapshot,
) -> Result<Conversion, ConvertError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ConvertError::InvalidInput(format!(
            "amount must be a finite non-negative number, got {amount}"
        )));
    }
    if from.is_empty() || to.is_empty() {
        return Err(ConvertError::InvalidInput(
            "currency codes must not be empty".to_string(),
        ));
    }
    if snapshot.rates.is_empty() {
        return Err(ConvertError::MissingRates);
    }

    let based_on_from = if snapshot.base_code.is_empty() {
        snapshot.rates.get(from) == Some(&1.0)
    } else {
        snapshot.base_code == from
    };

    let to_rate = rate_for(snapshot, to)?;
    let (rate, path) = if based_on_from {
        (to_rate, ConversionPath::Direct)
    } else {
        let from_rate = rate_for(snapshot, from)?;
        (to_rate / from_rate, ConversionPath::CrossBase)
    };

    let result = amount * rate;
    if !rate.is_finite() || !result.is_finite() {
        return Err(ConvertError::OutOfRange(format!(
            "{amount} {from} to {to} does not fit in a finite number"
        )));
    }

    Ok(Conversion { result, rate, path })
}
