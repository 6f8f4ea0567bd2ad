use chrono::DateTime;
use meta_backing::*;
use meta_core::{AccountId, ObjectId, ObjectType, Timestamp};
use proptest::prelude::*;

const START: i64 = 1_700_000_040;
const WEEK_MINUTES: u32 = 10_080;

fn minutes(m: i64) -> Timestamp {
    DateTime::from_timestamp(START + m * 60, 0).unwrap()
}

fn week_property() -> Property {
    Property::new(
        ObjectId::new(ObjectType::Property, 0),
        0xC0FFEE,
        AccountId(5),
        PropertyOptions {
            title: "Gold reserve certificate".to_string(),
            description: "Vault receipt 2291".to_string(),
            contact_email: "custody@example.com".to_string(),
            appraised_value: 1_000_000_000,
            duration_minutes: WEEK_MINUTES,
            backing_asset: "META1".to_string(),
        },
        minutes(0),
        &ScheduleCalculator::default(),
    )
    .unwrap()
}

#[test]
fn test_week_unapproved_lifecycle() {
    let calc = ScheduleCalculator::default();
    let mut p = week_property();

    // one block per minute up to the 25% point
    for m in 1..=2_520 {
        p.tick(minutes(m), &calc);
    }
    assert_eq!(p.initial_counter, p.initial_counter_max);
    assert_eq!(p.contribution(), 2_500_000_000);

    p.tick(minutes(5_000), &calc);
    assert_eq!(p.stage(minutes(5_000)), Stage::AwaitingApproval);
    assert_eq!(p.contribution(), 2_500_000_000);

    assert_eq!(p.tick(minutes(10_080), &calc), TickOutcome::Expired);
    assert_eq!(p.stage(minutes(10_080)), Stage::Expired);
    assert_eq!((p.initial_counter, p.approval_counter), (0, 0));
    assert_eq!(p.contribution(), 0);
}

#[test]
fn test_week_approved_at_ten_percent() {
    let calc = ScheduleCalculator::default();
    let mut p = week_property();

    p.tick(minutes(1_008), &calc);
    p.approve(minutes(1_008), &calc).unwrap();
    assert!(!p.restarted);

    let mut last = p.progress().as_f64();
    let mut m = 1_008;
    while m < 10_079 {
        m += 7;
        p.tick(minutes(m.min(10_079)), &calc);
        let now = p.progress().as_f64();
        assert!(now >= last);
        last = now;
    }
    assert!(!p.progress().is_complete());

    assert_eq!(p.tick(minutes(10_080), &calc), TickOutcome::Matured);
    assert!(p.progress().is_complete());
    assert_eq!(p.contribution(), 10_000_000_000);
}

#[test]
fn test_late_approval_keeps_deadline() {
    let calc = ScheduleCalculator::default();
    let mut p = week_property();

    p.tick(minutes(2_520), &calc);
    p.tick(minutes(6_000), &calc);
    let frozen = p.contribution();

    p.approve(minutes(6_000), &calc).unwrap();
    assert_eq!(p.approval_counter_max, 10_080 - 6_000);
    assert_eq!(p.contribution(), frozen);

    p.tick(minutes(10_079), &calc);
    assert_eq!(p.approval_counter, p.approval_counter_max - 1);
    p.tick(minutes(10_080), &calc);
    assert_eq!(p.terminal, Some(TerminalState::MaturedApproved));
}

#[test]
fn test_committed_valuation_ignores_expired() {
    let calc = ScheduleCalculator::default();
    let mut expired = week_property();
    expired.tick(minutes(10_080), &calc);
    let live = week_property();

    assert_eq!(committed_valuation([&expired, &live], "META1"), 10_000_000_000);
}

proptest! {
    #[test]
    fn prop_counters_stay_within_maxima(
        duration in 4u32..500,
        approve_at in proptest::option::of(0i64..600),
        steps in proptest::collection::vec(1i64..40, 1..60),
    ) {
        let calc = ScheduleCalculator::default();
        let mut p = Property::new(
            ObjectId::new(ObjectType::Property, 0),
            1,
            AccountId(1),
            PropertyOptions {
                title: "t".to_string(),
                description: String::new(),
                contact_email: "a@b.io".to_string(),
                appraised_value: 123_456_789,
                duration_minutes: duration,
                backing_asset: "META1".to_string(),
            },
            minutes(0),
            &calc,
        ).unwrap();

        let mut now = 0i64;
        let mut last = p.progress();
        for step in steps {
            now += step;
            if approve_at.map_or(false, |a| a <= now) && !p.is_approved() {
                let _ = p.approve(minutes(now), &calc);
            }
            let before = p.clone();
            p.tick(minutes(now), &calc);

            prop_assert!(p.initial_counter <= p.initial_counter_max);
            prop_assert!(p.approval_counter <= p.approval_counter_max);
            let progress = p.progress();
            prop_assert!(progress.numerator <= progress.denominator);
            if p.terminal != Some(TerminalState::ExpiredUnapproved) {
                prop_assert!(progress.as_f64() >= last.as_f64() - 1e-12);
            }
            last = progress;

            // ticking again at the same head time changes nothing
            let again = p.clone();
            p.tick(minutes(now), &calc);
            prop_assert_eq!(&p, &again);
            prop_assert!(before.terminal.is_none() || before == p);
        }
    }

    #[test]
    fn prop_early_approval_completes_exactly(duration in 4u32..2_000, step in 1i64..90) {
        let calc = ScheduleCalculator::default();
        let mut p = Property::new(
            ObjectId::new(ObjectType::Property, 0),
            1,
            AccountId(1),
            PropertyOptions {
                title: "t".to_string(),
                description: String::new(),
                contact_email: "a@b.io".to_string(),
                appraised_value: 999,
                duration_minutes: duration,
                backing_asset: "META1".to_string(),
            },
            minutes(0),
            &calc,
        ).unwrap();
        p.approve(minutes(0), &calc).unwrap();

        let mut now = 0;
        while now < duration as i64 {
            now = (now + step).min(duration as i64);
            p.tick(minutes(now), &calc);
        }
        prop_assert!(p.progress().is_complete());
        prop_assert_eq!(p.contribution(), 9_990);
    }
}
