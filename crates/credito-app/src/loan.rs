// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Amortized-loan arithmetic.
//!
//! The monthly payment is a derived value: every mutation of [`LoanTerms`]
//! recomputes it, so the payment shown to the user and the payment submitted
//! with an application always agree with the terms they were computed from.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Placeholder rendered while the terms are incomplete.
pub const PAYMENT_PENDING_LABEL: &str = "calculating...";

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Standard annuity payment, rounded half-up to cents.
///
/// Returns `None` when the principal or term is missing or not positive, or
/// when the rate is missing or negative. A zero rate degenerates to an even
/// split of the principal across the term; very long terms converge on the
/// interest-only payment `principal * r`.
pub fn compute_monthly_payment(
    principal: Option<Decimal>,
    annual_rate_percent: Option<Decimal>,
    term_months: Option<u32>,
) -> Option<Decimal> {
    let principal = principal.filter(|value| value.is_sign_positive() && !value.is_zero())?;
    let months = term_months.filter(|months| *months > 0)?;
    let rate = annual_rate_percent.filter(|rate| !rate.is_sign_negative() || rate.is_zero())?;

    let even_split = principal.checked_div(Decimal::from(months))?;
    let raw = if rate.is_zero() {
        even_split
    } else {
        let monthly_rate = rate.checked_div(PERCENT)?.checked_div(MONTHS_PER_YEAR)?;
        let interest_only = principal.checked_mul(monthly_rate)?;
        // Past Decimal's range (1+r)^-n is indistinguishable from zero.
        let discount = match Decimal::ONE
            .checked_add(monthly_rate)?
            .checked_powu(u64::from(months))
        {
            Some(growth) => Decimal::ONE.checked_div(growth).unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        let denominator = Decimal::ONE - discount;
        if denominator.is_zero() {
            even_split
        } else {
            interest_only.checked_div(denominator)?
        }
    };

    Some(round_cents(raw))
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Editable loan terms with an always-consistent monthly payment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoanTerms {
    principal: Option<Decimal>,
    annual_rate_percent: Option<Decimal>,
    term_months: Option<u32>,
    monthly_payment: Option<Decimal>,
}

impl LoanTerms {
    pub fn new(
        principal: Option<Decimal>,
        annual_rate_percent: Option<Decimal>,
        term_months: Option<u32>,
    ) -> Self {
        let mut terms = Self {
            principal,
            annual_rate_percent,
            term_months,
            monthly_payment: None,
        };
        terms.recompute();
        terms
    }

    pub fn principal(&self) -> Option<Decimal> {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> Option<Decimal> {
        self.annual_rate_percent
    }

    pub fn term_months(&self) -> Option<u32> {
        self.term_months
    }

    pub fn monthly_payment(&self) -> Option<Decimal> {
        self.monthly_payment
    }

    pub fn set_principal(&mut self, principal: Option<Decimal>) {
        self.principal = principal;
        self.recompute();
    }

    pub fn set_annual_rate_percent(&mut self, rate: Option<Decimal>) {
        self.annual_rate_percent = rate;
        self.recompute();
    }

    pub fn set_term_months(&mut self, months: Option<u32>) {
        self.term_months = months;
        self.recompute();
    }

    pub fn payment_label(&self) -> String {
        self.monthly_payment
            .map(format_money)
            .unwrap_or_else(|| PAYMENT_PENDING_LABEL.to_owned())
    }

    /// Sum of all payments over the term.
    pub fn total_repayment(&self) -> Option<Decimal> {
        let payment = self.monthly_payment?;
        let months = self.term_months?;
        payment.checked_mul(Decimal::from(months))
    }

    pub fn total_interest(&self) -> Option<Decimal> {
        self.total_repayment()?.checked_sub(self.principal?)
    }

    fn recompute(&mut self) {
        self.monthly_payment =
            compute_monthly_payment(self.principal, self.annual_rate_percent, self.term_months);
    }
}

/// Lenient amount parser for typed input: tolerates `$`, thousands
/// separators and surrounding whitespace. Anything else yields `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',' && *ch != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

pub fn parse_rate(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

pub fn parse_term(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// `$1,234.56`, negative values as `-$1,234.56`.
pub fn format_money(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{fraction}")
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
