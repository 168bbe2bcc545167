//! Fee and tax split of a confirmed amount.
//!
//! Every figure is rounded to two decimal places right after the step that
//! produces it. Historical invoices were issued with this exact ordering, so
//! the figures must not be recomputed with a single rounding at the end.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

/// Percentages applied by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRates {
    pub convenience_fee: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub gst: Decimal,
    pub tds: Decimal,
    pub tcs: Decimal,
    pub commission: Decimal,
    pub tds_under_194h: Decimal,
}

impl FeeRates {
    pub const STANDARD: FeeRates = FeeRates {
        convenience_fee: dec!(5),
        cgst: dec!(9),
        sgst: dec!(9),
        gst: dec!(18),
        tds: dec!(0.1),
        tcs: dec!(0.5),
        commission: dec!(5),
        tds_under_194h: dec!(2),
    };

    /// Splits `amount`, which must lie within `0..=MAX_AMOUNT`.
    ///
    /// Stored amounts are `NUMERIC(12, 2)` and always fit; external input goes
    /// through [`check_amount`] first. Larger values overflow `Decimal`.
    pub fn breakdown(&self, amount: Decimal, is_tax_registered_vendor: bool) -> FeeBreakdown {
        let amount = round2(amount);

        let convenience_fee = percent_of(amount, self.convenience_fee);
        let cgst = percent_of(amount, self.cgst);
        let sgst = percent_of(amount, self.sgst);
        // GST on the buyer side is charged on amount plus convenience fee, unlike cgst/sgst above.
        let total_gst = percent_of(amount + convenience_fee, self.gst);
        let amount_with_tax = round2(amount + convenience_fee + total_gst);

        let tds = percent_of(amount, self.tds);
        let tcs = percent_of(amount, self.tcs);

        let amount_payable_to_vendor = if is_tax_registered_vendor {
            round2(amount + amount * self.gst / HUNDRED)
        } else {
            amount
        };
        let net_payable = round2(amount_payable_to_vendor - tds - tcs);

        let commission = percent_of(amount, self.commission);
        let gst_on_commission = percent_of(commission, self.cgst + self.sgst);
        let tds_under_194h = percent_of(commission, self.tds_under_194h);
        // Not rounded: payouts already issued were computed this way.
        let net_commission = commission + gst_on_commission - tds_under_194h;
        let tds_withhold = tds_under_194h;

        let net_payable_to_vendor = round2(net_payable - net_commission - tds_withhold);

        FeeBreakdown {
            amount,
            convenience_fee,
            cgst,
            sgst,
            total_gst,
            amount_with_tax,
            tds,
            tcs,
            amount_payable_to_vendor,
            net_payable,
            commission,
            gst_on_commission,
            tds_under_194h,
            net_commission,
            tds_withhold,
            net_payable_to_vendor,
        }
    }
}

impl Default for FeeRates {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Every monetary figure derived from one confirmed amount.
///
/// Recomputable byte for byte from `(amount, is_tax_registered_vendor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub amount: Decimal,
    pub convenience_fee: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    #[serde(rename = "totalGST")]
    pub total_gst: Decimal,
    pub amount_with_tax: Decimal,
    pub tds: Decimal,
    pub tcs: Decimal,
    pub amount_payable_to_vendor: Decimal,
    pub net_payable: Decimal,
    pub commission: Decimal,
    #[serde(rename = "GSTOnCommission")]
    pub gst_on_commission: Decimal,
    #[serde(rename = "tdsUnder194H")]
    pub tds_under_194h: Decimal,
    pub net_commission: Decimal,
    pub tds_withhold: Decimal,
    pub net_payable_to_vendor: Decimal,
}

/// Breakdown under the standard rate table.
pub fn compute_breakdown(amount: Decimal, is_tax_registered_vendor: bool) -> FeeBreakdown {
    FeeRates::STANDARD.breakdown(amount, is_tax_registered_vendor)
}

/// Largest amount a booking can carry, the ceiling of `NUMERIC(12, 2)`.
pub const MAX_AMOUNT: Decimal = dec!(9999999999.99);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount must not be negative")]
    Negative,
    #[error("Amount must not exceed {}", MAX_AMOUNT)]
    TooLarge,
}

/// Rejects amounts the calculator cannot split.
pub fn check_amount(amount: Decimal) -> Result<Decimal, AmountError> {
    if amount < Decimal::ZERO {
        Err(AmountError::Negative)
    } else if amount > MAX_AMOUNT {
        Err(AmountError::TooLarge)
    } else {
        Ok(amount)
    }
}

const HUNDRED: Decimal = dec!(100);

fn percent_of(base: Decimal, rate: Decimal) -> Decimal {
    round2(base * rate / HUNDRED)
}

/// Half away from zero, always carrying exactly two decimal places.
fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
