use rust_decimal::Decimal;
use thiserror::Error;

/// Violations of the amount-ledger invariant `0 <= wasool <= amount`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Total amount must be a non-negative number")]
    NegativeTotal,
    #[error("Wasool amount must be a non-negative number")]
    NegativeWasool,
    #[error("Wasool amount cannot exceed total amount")]
    WasoolExceedsTotal,
}

/// Validate a (total, collected) pair and derive the outstanding balance.
///
/// This is the single authoritative implementation of
/// `bakaya = round2(amount - wasool)`. Handlers persist the returned value
/// verbatim and ignore anything the client may have computed.
pub fn compute_bakaya(amount: Decimal, wasool_amount: Decimal) -> Result<Decimal, AmountError> {
    if amount < Decimal::ZERO {
        return Err(AmountError::NegativeTotal);
    }
    if wasool_amount < Decimal::ZERO {
        return Err(AmountError::NegativeWasool);
    }
    if wasool_amount > amount {
        return Err(AmountError::WasoolExceedsTotal);
    }

    Ok((amount - wasool_amount).round_dp(2))
}
