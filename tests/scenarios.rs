use chrono::{Duration, NaiveDate, NaiveDateTime};
use load_profile_forecaster::domain::{HourlySample, MatchSplit, WINDOW_HOURS};
use load_profile_forecaster::forecast::{ProfileEngine, ProfileError};
use proptest::prelude::*;
use rstest::rstest;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

/// Full days of a repeating 24-value shape, then `today_hours` hours of the
/// following day.
fn series(first: NaiveDate, full_days: i64, today_hours: i64, shape: impl Fn(usize) -> f64) -> Vec<HourlySample> {
    let start = at(first, 0, 0);
    (0..full_days * 24 + today_hours)
        .map(|h| HourlySample::new(start + Duration::hours(h), shape((h % 24) as usize)))
        .collect()
}

fn household(hour: usize) -> f64 {
    match hour {
        0..=5 => 0.3,
        6..=8 => 1.4,
        9..=16 => 0.6,
        17..=21 => 2.1,
        _ => 0.8,
    }
}

#[test]
fn flat_history_predicts_flat_consumption() {
    let samples = series(day(3), 3, 5, |_| 1.0);
    let now = at(day(6), 5, 30);

    let prediction = ProfileEngine::default().run(&samples, now).unwrap();

    assert_eq!(prediction.current_hour, 5);
    assert_eq!(prediction.match_hours, 29);
    assert_eq!(prediction.predict_hours, 43);
    assert_eq!(prediction.sample_count, 1);
    assert!((prediction.similarity_score - 1.0).abs() < 1e-9);
    assert_eq!(prediction.predicted_consumption.len(), 43);
    assert!(prediction
        .predicted_consumption
        .iter()
        .all(|v| (v - 1.0).abs() < 1e-9));
    assert!((prediction.predicted_total - 43.0).abs() < 1e-9);
    assert_eq!(prediction.floor_applied_count, 0);
    assert_eq!(prediction.interpolated_hours, 0);
    assert_eq!(prediction.best_match_start, day(3));
}

#[rstest]
#[case::no_history(0)]
#[case::one_day(1)]
#[case::two_days(2)]
fn too_few_days_reports_daily_profiles(#[case] full_days: i64) {
    let first = day(10) - Duration::days(full_days);
    let samples = series(first, full_days, 8, household);
    let now = at(day(10), 8, 15);

    let err = ProfileEngine::default().run(&samples, now).unwrap_err();
    assert!(err.is_data_insufficiency());
    assert!(
        err.reason().starts_with("not_enough_daily_profiles_"),
        "unexpected reason {}",
        err.reason()
    );
}

#[test]
fn days_with_too_many_gaps_do_not_count() {
    // Three days, but the middle one lost its whole afternoon
    let mut samples = series(day(7), 3, 6, household);
    samples.retain(|s| !(s.date() == day(8) && (12..20).contains(&s.hour())));

    let err = ProfileEngine::default().run(&samples, at(day(10), 6, 0)).unwrap_err();
    assert_eq!(
        err,
        ProfileError::NotEnoughDailyProfiles {
            found: 2,
            required: 3
        }
    );
}

#[test]
fn missing_today_reports_current_data() {
    // Plenty of history, but nothing recorded since midnight
    let samples = series(day(1), 9, 0, household);
    let now = at(day(10), 9, 0);

    let err = ProfileEngine::default().run(&samples, now).unwrap_err();
    assert!(
        err.reason().starts_with("not_enough_current_data_"),
        "unexpected reason {}",
        err.reason()
    );
    assert_eq!(
        err,
        ProfileError::NotEnoughCurrentData {
            available: 24,
            required: 33
        }
    );
}

#[test]
fn repeated_runs_are_identical() {
    let samples = series(day(1), 12, 14, |h| household(h) * (1.0 + 0.01 * h as f64));
    let now = at(day(13), 14, 40);
    let engine = ProfileEngine::default();

    let first = engine.run(&samples, now).unwrap();
    let second = engine.run(&samples, now).unwrap();

    assert_eq!(first, second);
    let bits = |p: &[f64]| p.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first.predicted_consumption), bits(&second.predicted_consumption));
}

#[test]
fn regular_household_is_reproduced() {
    let samples = series(day(1), 14, 10, household);
    let now = at(day(15), 10, 5);

    let prediction = ProfileEngine::default().run(&samples, now).unwrap();

    assert_eq!(prediction.sample_count, 7);
    assert!(prediction.similarity_score > 0.99);
    for (i, value) in prediction.predicted_consumption.iter().enumerate() {
        let hour = (prediction.match_hours + i) % 24;
        assert!((value - household(hour)).abs() < 1e-9, "hour {hour}: {value}");
    }
    let points = prediction.hourly_points();
    assert_eq!(points[0].0, at(day(15), 10, 0));
    assert_eq!(points.len(), prediction.predict_hours);
}

#[test]
fn running_hour_is_not_part_of_the_window() {
    let mut samples = series(day(1), 6, 4, household);
    // Partial reading for the hour still in progress
    samples.push(HourlySample::new(at(day(7), 4, 0), 0.05));

    let prediction = ProfileEngine::default().run(&samples, at(day(7), 4, 20)).unwrap();
    assert_eq!(prediction.match_hours, 28);
    assert!(prediction.similarity_score > 0.99);
}

proptest! {
    #[test]
    fn match_and_predict_cover_the_window(hour in 0usize..24) {
        let split = MatchSplit::for_hour(hour);
        prop_assert_eq!(split.match_hours + split.predict_hours, WINDOW_HOURS);
        prop_assert_eq!(split.match_hours, 24 + hour);
    }
}
