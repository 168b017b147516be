//! Margin ratio and risk classification
//!
//! Pure integer math over a decoded [`Account`]; cheap enough to run
//! across a full slab on every snapshot.

use crate::slab::Account;

/// Risk buckets, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Healthy,
    Warning,
    Danger,
    Liquidatable,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Healthy => "healthy",
            RiskLevel::Warning => "warning",
            RiskLevel::Danger => "danger",
            RiskLevel::Liquidatable => "liquidatable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountHealth {
    pub margin_ratio_bps: u64,
    pub risk_level: RiskLevel,
    pub liquidatable: bool,
}

/// Margin ratio reported for a flat account.
const FLAT_RATIO_BPS: u64 = 10_000;

/// Fixed classification breakpoints, independent of the market's
/// maintenance margin (which only gates `liquidatable`).
const DANGER_BPS: u64 = 1_000;
const WARNING_BPS: u64 = 2_000;

/// Compute the margin ratio for one account at a given mark price.
///
/// `margin_ratio_bps = capital * 10000 * 10^decimals / (|position_size| * mark_price_e6)`,
/// i.e. capital over notional in basis points, truncating toward zero.
/// A flat position or a zero price is maximally healthy by definition.
///
/// The intermediate product is computed in 128 bits with checked
/// arithmetic: a numerator overflow saturates the ratio high (the account
/// is overwhelmingly collateralized), a denominator overflow drives it to
/// zero (the notional dwarfs any capital).
pub fn compute_health(
    account: &Account,
    mark_price_e6: u64,
    decimals: u32,
    maintenance_margin_bps: u64,
) -> AccountHealth {
    let abs_pos = account.position_size.unsigned_abs();
    if abs_pos == 0 || mark_price_e6 == 0 {
        return AccountHealth {
            margin_ratio_bps: FLAT_RATIO_BPS,
            risk_level: RiskLevel::Healthy,
            liquidatable: false,
        };
    }

    let numerator = account
        .capital
        .checked_mul(10_000)
        .zip(10u128.checked_pow(decimals))
        .and_then(|(scaled, pow)| scaled.checked_mul(pow));
    let denominator = abs_pos.checked_mul(mark_price_e6 as u128);

    let margin_ratio_bps = match (numerator, denominator) {
        (Some(num), Some(den)) => (num / den).min(u64::MAX as u128) as u64,
        (None, _) => u64::MAX,
        (_, None) => 0,
    };

    let liquidatable = margin_ratio_bps < maintenance_margin_bps;
    let risk_level = if liquidatable {
        RiskLevel::Liquidatable
    } else if margin_ratio_bps < DANGER_BPS {
        RiskLevel::Danger
    } else if margin_ratio_bps < WARNING_BPS {
        RiskLevel::Warning
    } else {
        RiskLevel::Healthy
    };

    AccountHealth {
        margin_ratio_bps,
        risk_level,
        liquidatable,
    }
}
