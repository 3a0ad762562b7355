//! Property-based tests for forecast aggregation

use super::test_support::{local_ts, moscow};
use super::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

const SLOTS: [u32; 8] = [0, 3, 6, 9, 12, 15, 18, 21];

// Quarter degrees keep every partial sum exact, so averages do not depend
// on summation order.
fn arb_sample() -> impl Strategy<Value = Sample> {
    (0u32..6, 0usize..SLOTS.len(), -160i32..160).prop_map(|(day, slot, quarters)| {
        Sample::new(
            local_ts(moscow(), 2024, 6, 1 + day, SLOTS[slot]),
            f64::from(quarters) / 4.0,
        )
    })
}

fn arb_ordered_series() -> impl Strategy<Value = Vec<Sample>> {
    proptest::collection::vec(arb_sample(), 1..40).prop_map(|mut samples| {
        samples.sort_by_key(|s| s.timestamp);
        samples
    })
}

fn sorted_by_date(mut summaries: Vec<DaySummary>) -> Vec<DaySummary> {
    summaries.sort_by_key(|s| s.date);
    summaries
}

proptest! {
    #[test]
    fn one_ascending_entry_per_date(samples in arb_ordered_series()) {
        let zone = moscow();
        let summaries = aggregate(&samples, zone);

        let expected: BTreeSet<NaiveDate> = samples
            .iter()
            .map(|s| localize(s, zone).unwrap().date)
            .collect();
        let dates: Vec<NaiveDate> = summaries.iter().map(|s| s.date).collect();

        prop_assert_eq!(dates.len(), expected.len());
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(dates, expected.into_iter().collect::<Vec<_>>());
        prop_assert_eq!(render_forecast(&samples, zone).lines().count(), summaries.len());
    }

    #[test]
    fn night_samples_do_not_change_averages(
        samples in arb_ordered_series(),
        night_temps in proptest::collection::vec(-100i32..100, 1..8),
    ) {
        let zone = moscow();
        let baseline = aggregate(&samples, zone);

        // Only add night readings to dates that already have a bucket
        let mut with_night = samples.clone();
        for (i, temp) in night_temps.iter().enumerate() {
            let day = &baseline[i % baseline.len()];
            let ts = local_ts(zone, 2024, 6, day.date.day(), [0, 3][i % 2]);
            with_night.push(Sample::new(ts, f64::from(*temp) * 10.0));
        }
        with_night.sort_by_key(|s| s.timestamp);

        prop_assert_eq!(aggregate(&with_night, zone), baseline);
    }

    #[test]
    fn sample_order_does_not_change_averages(
        (original, shuffled) in arb_ordered_series()
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let zone = moscow();
        prop_assert_eq!(
            sorted_by_date(aggregate(&shuffled, zone)),
            sorted_by_date(aggregate(&original, zone))
        );
    }

    #[test]
    fn rendering_never_shows_nan(samples in arb_ordered_series()) {
        let text = render_forecast(&samples, moscow());
        prop_assert!(!text.contains("NaN"));
        prop_assert!(!text.contains("inf"));
    }
}
