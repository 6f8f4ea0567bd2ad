//! Valuation aggregation
//!
//! The cumulative valuation of a symbol is a pure fold over the properties
//! backing it. Every symbol with at least one property is visited; expired
//! claims add zero and matured claims add their full value.

use crate::error::{BackingError, Result};
use crate::property::{Property, TerminalState};
use meta_core::constants::MAX_SHARE_SUPPLY;
use std::collections::BTreeMap;

/// Sum contributions per backing symbol. Fails if any symbol's sum exceeds
/// the max share supply.
pub fn cumulative_valuations<'a, I>(properties: I) -> Result<BTreeMap<String, u128>>
where
    I: IntoIterator<Item = &'a Property>,
{
    let mut sums: BTreeMap<String, u128> = BTreeMap::new();
    for property in properties {
        let sum = sums.entry(property.backing_asset().to_string()).or_insert(0);
        *sum = sum.saturating_add(property.contribution());
    }

    if let Some((symbol, value)) = sums
        .iter()
        .find(|(_, value)| **value > MAX_SHARE_SUPPLY as u128)
    {
        return Err(BackingError::ValuationOverflow {
            symbol: symbol.clone(),
            value: *value,
        });
    }

    Ok(sums)
}

/// Valuation of one symbol
pub fn valuation_of<'a, I>(properties: I, symbol: &str) -> Result<u128>
where
    I: IntoIterator<Item = &'a Property>,
{
    let valuations =
        cumulative_valuations(properties.into_iter().filter(|p| p.backing_asset() == symbol))?;
    Ok(valuations.get(symbol).copied().unwrap_or(0))
}

/// Largest valuation the symbol's live claims could reach, i.e. the sum of
/// full contributions of every claim that has not expired
pub fn committed_valuation<'a, I>(properties: I, symbol: &str) -> u128
where
    I: IntoIterator<Item = &'a Property>,
{
    properties
        .into_iter()
        .filter(|p| p.backing_asset() == symbol)
        .filter(|p| p.terminal != Some(TerminalState::ExpiredUnapproved))
        .map(Property::full_contribution)
        .fold(0u128, u128::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyOptions;
    use crate::schedule::ScheduleCalculator;
    use chrono::DateTime;
    use meta_core::{AccountId, ObjectId, ObjectType, Timestamp};

    const START: i64 = 1_700_000_040;

    fn minutes(m: i64) -> Timestamp {
        DateTime::from_timestamp(START + m * 60, 0).unwrap()
    }

    fn property(claim_id: u32, symbol: &str, value: u64) -> Property {
        Property::new(
            ObjectId::new(ObjectType::Property, claim_id as u64),
            claim_id,
            AccountId(1),
            PropertyOptions {
                title: format!("claim {}", claim_id),
                description: String::new(),
                contact_email: "owner@example.com".to_string(),
                appraised_value: value,
                duration_minutes: 100,
                backing_asset: symbol.to_string(),
            },
            minutes(0),
            &ScheduleCalculator::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_groups_by_symbol() {
        let calc = ScheduleCalculator::default();
        let mut a = property(1, "META1", 1_000);
        let mut b = property(2, "META1", 3_000);
        let mut c = property(3, "GOLDX", 500);
        for p in [&mut a, &mut b, &mut c] {
            p.tick(minutes(25), &calc);
        }

        let sums = cumulative_valuations([&a, &b, &c]).unwrap();
        // quarter of ten times the appraised value
        assert_eq!(sums["META1"], 10_000);
        assert_eq!(sums["GOLDX"], 1_250);
        assert_eq!(valuation_of([&a, &b, &c], "META1").unwrap(), 10_000);
        assert_eq!(valuation_of([&a, &b, &c], "NONE1").unwrap(), 0);
    }

    #[test]
    fn test_terminal_claims_are_visited() {
        let calc = ScheduleCalculator::default();
        let mut expired = property(1, "META1", 1_000);
        let mut matured = property(2, "META1", 2_000);
        matured.approve(minutes(1), &calc).unwrap();
        expired.tick(minutes(100), &calc);
        matured.tick(minutes(100), &calc);

        let sums = cumulative_valuations([&expired, &matured]).unwrap();
        assert_eq!(sums["META1"], 20_000);
        assert_eq!(committed_valuation([&expired, &matured], "META1"), 20_000);

        let sums = cumulative_valuations([&expired]).unwrap();
        assert_eq!(sums["META1"], 0);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let calc = ScheduleCalculator::default();
        let mut claims: Vec<Property> = (0..11)
            .map(|i| property(i, "META1", MAX_SHARE_SUPPLY / 100))
            .collect();
        for p in claims.iter_mut() {
            p.approve(minutes(0), &calc).unwrap();
            p.tick(minutes(100), &calc);
        }

        assert!(matches!(
            cumulative_valuations(claims.iter()),
            Err(BackingError::ValuationOverflow { .. })
        ));
        assert!(cumulative_valuations(claims.iter().take(10)).is_ok());
    }
}
