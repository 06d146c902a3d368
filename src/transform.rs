use crate::database::ForecastRecord;
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;

/// Reshapes a chronologically ordered forecast set into the tiered view:
/// every record of the earliest calendar date is kept as-is, and each
/// subsequent date collapses into one synthesized summary record.
///
/// Pure function over its input; records are never mutated and summaries
/// carry no persisted identity. Feeding an already-transformed list back in
/// is unsupported (single-record groups mechanically reduce to a truncated
/// copy).
pub fn transform_forecasts(records: Vec<ForecastRecord>) -> Vec<ForecastRecord> {
    let mut by_date: BTreeMap<NaiveDate, Vec<ForecastRecord>> = BTreeMap::new();
    for record in records {
        by_date
            .entry(record.forecast_time.date())
            .or_default()
            .push(record);
    }

    let mut result = Vec::new();
    let mut days = by_date.into_iter();

    if let Some((_, first_day_records)) = days.next() {
        result.extend(first_day_records);
    }
    for (date, group) in days {
        result.push(daily_summary(&group, date));
    }

    result
}

/// Summary for a single date's group. The group is non-empty by
/// construction of the grouping above.
fn daily_summary(group: &[ForecastRecord], date: NaiveDate) -> ForecastRecord {
    let count = group.len() as f64;

    let avg_temperature = group.iter().map(|r| r.temperature).sum::<f64>() / count;
    let avg_humidity = group.iter().map(|r| f64::from(r.humidity)).sum::<f64>() / count;

    let min_temperature = group
        .iter()
        .min_by(|a, b| a.min_temperature.total_cmp(&b.min_temperature))
        .map(|r| r.min_temperature)
        .unwrap_or_default();
    let max_temperature = group
        .iter()
        .max_by(|a, b| a.max_temperature.total_cmp(&b.max_temperature))
        .map(|r| r.max_temperature)
        .unwrap_or_default();

    ForecastRecord {
        id: None,
        city: group[0].city.clone(),
        forecast_time: date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)),
        temperature: truncate_two_decimals(avg_temperature),
        min_temperature: truncate_two_decimals(min_temperature),
        max_temperature: truncate_two_decimals(max_temperature),
        humidity: avg_humidity as i32,
        description: most_common(group.iter().map(|r| r.description.as_str())),
        icon_code: most_common(group.iter().map(|r| r.icon_code.as_str())),
        created_at: None,
    }
}

/// Truncates toward zero at two decimals: 15.369 becomes 15.36, not 15.37.
fn truncate_two_decimals(value: f64) -> f64 {
    (value * 100.0) as i64 as f64 / 100.0
}

/// The most frequent value; ties go to whichever value was seen first.
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((value, n));
        }
    }
    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 10).unwrap() + chrono::Duration::days(offset as i64)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        date: NaiveDate,
        hour: u32,
        temperature: f64,
        min_temperature: f64,
        max_temperature: f64,
        humidity: i32,
        description: &str,
        icon_code: &str,
    ) -> ForecastRecord {
        ForecastRecord {
            id: Some(uuid::Uuid::new_v4()),
            city: "Berlin".to_string(),
            forecast_time: date.and_hms_opt(hour, 0, 0).unwrap(),
            temperature,
            min_temperature,
            max_temperature,
            humidity,
            description: description.to_string(),
            icon_code: icon_code.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert!(transform_forecasts(Vec::new()).is_empty());
    }

    #[test]
    fn single_record_is_returned_unchanged() {
        let input = record(day(0), 9, 20.5, 18.0, 22.0, 65, "Clear sky", "01d");
        let id = input.id;

        let result = transform_forecasts(vec![input]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, id);
        assert_eq!(result[0].temperature, 20.5);
        assert_eq!(result[0].forecast_time, day(0).and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn first_day_kept_and_later_days_summarized() {
        let input = vec![
            record(day(0), 9, 20.0, 18.0, 22.0, 65, "Clear sky", "01d"),
            record(day(0), 12, 22.0, 20.0, 24.0, 60, "Clear sky", "01d"),
            record(day(0), 15, 24.0, 22.0, 26.0, 55, "Clear sky", "01d"),
            record(day(1), 9, 19.0, 17.0, 21.0, 70, "Partly cloudy", "02d"),
            record(day(1), 12, 21.0, 19.0, 23.0, 65, "Partly cloudy", "02d"),
            record(day(1), 15, 23.0, 21.0, 25.0, 60, "Clear sky", "01d"),
            record(day(2), 9, 18.0, 16.0, 20.0, 75, "Cloudy", "03d"),
            record(day(2), 12, 20.0, 18.0, 22.0, 70, "Cloudy", "03d"),
            record(day(2), 15, 22.0, 20.0, 24.0, 65, "Cloudy", "03d"),
        ];

        let result = transform_forecasts(input);

        // 3 first-day records plus one summary per later day.
        assert_eq!(result.len(), 5);

        // First day untouched, original order.
        assert_eq!(result[0].temperature, 20.0);
        assert_eq!(result[1].temperature, 22.0);
        assert_eq!(result[2].temperature, 24.0);
        assert!(result[0].id.is_some());

        let second_day = &result[3];
        assert_eq!(second_day.forecast_time, day(1).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(second_day.temperature, 21.0);
        assert_eq!(second_day.min_temperature, 17.0);
        assert_eq!(second_day.max_temperature, 25.0);
        assert_eq!(second_day.humidity, 65);
        assert_eq!(second_day.description, "Partly cloudy");
        assert_eq!(second_day.icon_code, "02d");
        assert_eq!(second_day.id, None);
        assert_eq!(second_day.created_at, None);

        let third_day = &result[4];
        assert_eq!(third_day.forecast_time, day(2).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(third_day.temperature, 20.0);
        assert_eq!(third_day.min_temperature, 16.0);
        assert_eq!(third_day.max_temperature, 24.0);
        assert_eq!(third_day.humidity, 70);
        assert_eq!(third_day.description, "Cloudy");
        assert_eq!(third_day.icon_code, "03d");
    }

    #[test]
    fn first_day_is_earliest_date_regardless_of_input_order() {
        let input = vec![
            record(day(1), 9, 19.0, 17.0, 21.0, 70, "Partly cloudy", "02d"),
            record(day(0), 9, 20.0, 18.0, 22.0, 65, "Clear sky", "01d"),
            record(day(0), 15, 24.0, 22.0, 26.0, 55, "Clear sky", "01d"),
        ];

        let result = transform_forecasts(input);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].forecast_time.date(), day(0));
        assert_eq!(result[1].forecast_time.date(), day(0));
        assert_eq!(result[2].forecast_time.date(), day(1));
        assert_eq!(result[2].id, None);
    }

    #[test]
    fn summary_statistics_are_truncated_not_rounded() {
        let input = vec![
            record(day(0), 9, 10.0, 9.0, 11.0, 60, "Clear sky", "01d"),
            record(
                day(1),
                9,
                14.194999999999999,
                13.765432109876543,
                14.987654321098765,
                65,
                "Clear sky",
                "01d",
            ),
            record(
                day(1),
                12,
                15.555555555555555,
                14.222222222222222,
                16.888888888888888,
                60,
                "Clear sky",
                "01d",
            ),
            record(
                day(1),
                15,
                16.333333333333333,
                15.111111111111111,
                17.555555555555555,
                55,
                "Clear sky",
                "01d",
            ),
        ];

        let result = transform_forecasts(input);
        let summary = &result[1];

        // Mean is 15.3612..., truncated to 15.36 rather than rounded to 15.37.
        assert_eq!(summary.temperature, 15.36);
        assert_eq!(summary.min_temperature, 13.76);
        assert_eq!(summary.max_temperature, 17.55);
        assert_eq!(summary.humidity, 60);
    }

    #[test]
    fn summary_picks_majority_description_and_icon() {
        let input = vec![
            record(day(0), 9, 20.0, 18.0, 22.0, 65, "Clear sky", "01d"),
            record(day(1), 9, 19.0, 17.0, 21.0, 70, "Rain", "10d"),
            record(day(1), 12, 21.0, 19.0, 23.0, 65, "Rain", "10d"),
            record(day(1), 15, 23.0, 21.0, 25.0, 60, "Cloudy", "03d"),
        ];

        let result = transform_forecasts(input);

        assert_eq!(result[1].description, "Rain");
        assert_eq!(result[1].icon_code, "10d");
    }

    #[test]
    fn summary_breaks_ties_by_first_encountered_value() {
        let input = vec![
            record(day(0), 9, 20.0, 18.0, 22.0, 65, "Clear sky", "01d"),
            record(day(1), 9, 19.0, 17.0, 21.0, 70, "Cloudy", "03d"),
            record(day(1), 12, 21.0, 19.0, 23.0, 65, "Rain", "10d"),
        ];

        let result = transform_forecasts(input);

        assert_eq!(result[1].description, "Cloudy");
        assert_eq!(result[1].icon_code, "03d");
    }

    #[test]
    fn output_size_is_first_day_count_plus_distinct_later_dates() {
        let mut input = Vec::new();
        for hour in [6, 9, 12, 15] {
            input.push(record(day(0), hour, 20.0, 18.0, 22.0, 65, "Clear sky", "01d"));
        }
        for offset in 1..4 {
            input.push(record(day(offset), 9, 19.0, 17.0, 21.0, 70, "Cloudy", "03d"));
            input.push(record(day(offset), 15, 21.0, 19.0, 23.0, 60, "Cloudy", "03d"));
        }

        let result = transform_forecasts(input);

        assert_eq!(result.len(), 4 + 3);
    }
}
