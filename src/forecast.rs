//! Forecast aggregation
//!
//! Turns a provider's time-ordered series of temperature samples into a
//! per-day digest with one averaged value per time-of-day period.

#[cfg(test)]
mod proptests;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Weekday};
use std::collections::HashMap;
use thiserror::Error;

/// Rendered when a series has no usable samples at all
pub const NO_DATA_MESSAGE: &str = "Нет данных прогноза.";

/// Rendered in place of the period segments when a day has none.
///
/// One dash for the whole day instead of `Утро: -, День: -, Вечер: -`:
/// only night samples fell on that date, usually the last partial day of
/// the provider window, and three empty segments add noise to every digest.
const EMPTY_DAY_PLACEHOLDER: &str = "-";

/// One raw forecast data point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Degrees Celsius; `None` when the provider omitted the reading
    pub temperature: Option<f64>,
}

impl Sample {
    #[allow(dead_code)] // Used by tests and fixtures
    pub fn new(timestamp: i64, temperature: f64) -> Self {
        Self {
            timestamp,
            temperature: Some(temperature),
        }
    }
}

/// A provider forecast for a single location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSeries {
    pub samples: Vec<Sample>,
}

/// Sample rejected during aggregation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidSample {
    #[error("timestamp {0} is out of range")]
    Timestamp(i64),
    #[error("sample at {0} has no temperature")]
    MissingTemperature(i64),
    #[error("sample at {timestamp} has non-finite temperature {value}")]
    NonFiniteTemperature { timestamp: i64, value: f64 },
}

/// Time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Morning,
    Day,
    Evening,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Morning, Period::Day, Period::Evening];

    /// Period for an hour of day; hours before 06:00 belong to none
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            6..=11 => Some(Period::Morning),
            12..=17 => Some(Period::Day),
            18..=23 => Some(Period::Evening),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Morning => "Утро",
            Period::Day => "День",
            Period::Evening => "Вечер",
        }
    }

    fn index(self) -> usize {
        match self {
            Period::Morning => 0,
            Period::Day => 1,
            Period::Evening => 2,
        }
    }
}

/// Two-letter Russian abbreviation of a weekday
pub fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Пн",
        Weekday::Tue => "Вт",
        Weekday::Wed => "Ср",
        Weekday::Thu => "Чт",
        Weekday::Fri => "Пт",
        Weekday::Sat => "Сб",
        Weekday::Sun => "Вс",
    }
}

/// Averaged temperatures for one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Indexed by [`Period::ALL`] order; `None` when no samples fell in the period
    averages: [Option<f64>; 3],
}

impl DaySummary {
    pub fn average(&self, period: Period) -> Option<f64> {
        self.averages[period.index()]
    }

    pub fn weekday(&self) -> &'static str {
        weekday_abbrev(self.date.weekday())
    }

    /// `DD.MM.YY (Дн): Утро: X.XX°C, ...` with absent periods omitted
    pub fn render(&self) -> String {
        let segments: Vec<String> = Period::ALL
            .iter()
            .filter_map(|period| {
                self.average(*period)
                    .map(|avg| format!("{}: {avg:.2}°C", period.label()))
            })
            .collect();

        let body = if segments.is_empty() {
            EMPTY_DAY_PLACEHOLDER.to_string()
        } else {
            segments.join(", ")
        };

        format!("{} ({}): {body}", self.date.format("%d.%m.%y"), self.weekday())
    }
}

#[derive(Debug, Default)]
struct PeriodAccumulator {
    sum: f64,
    count: u32,
}

impl PeriodAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

/// A validated sample placed in the reference time zone
#[derive(Debug, Clone, Copy)]
struct LocalReading {
    date: NaiveDate,
    hour: u32,
    temperature: f64,
}

fn localize(sample: &Sample, zone: FixedOffset) -> Result<LocalReading, InvalidSample> {
    if sample.timestamp < 0 {
        return Err(InvalidSample::Timestamp(sample.timestamp));
    }
    let utc = DateTime::from_timestamp(sample.timestamp, 0)
        .ok_or(InvalidSample::Timestamp(sample.timestamp))?;
    let temperature = sample
        .temperature
        .ok_or(InvalidSample::MissingTemperature(sample.timestamp))?;
    if !temperature.is_finite() {
        return Err(InvalidSample::NonFiniteTemperature {
            timestamp: sample.timestamp,
            value: temperature,
        });
    }

    // Near the end of chrono's range the offset can overflow the local time
    let local = utc
        .naive_utc()
        .checked_add_offset(zone)
        .ok_or(InvalidSample::Timestamp(sample.timestamp))?;
    Ok(LocalReading {
        date: local.date(),
        hour: local.hour(),
        temperature,
    })
}

/// Group samples by calendar date and average each period.
///
/// Dates keep the order in which they first appear, so a time-ordered input
/// produces ascending dates. Invalid samples are logged and skipped.
pub fn aggregate(samples: &[Sample], zone: FixedOffset) -> Vec<DaySummary> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut buckets: HashMap<NaiveDate, [PeriodAccumulator; 3]> = HashMap::new();

    for sample in samples {
        let reading = match localize(sample, zone) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid forecast sample");
                continue;
            }
        };

        let bucket = buckets.entry(reading.date).or_insert_with(|| {
            order.push(reading.date);
            Default::default()
        });

        if let Some(period) = Period::from_hour(reading.hour) {
            bucket[period.index()].push(reading.temperature);
        }
    }

    order
        .into_iter()
        .filter_map(|date| {
            let accs = buckets.remove(&date)?;
            Some(DaySummary {
                date,
                averages: [accs[0].mean(), accs[1].mean(), accs[2].mean()],
            })
        })
        .collect()
}

/// Aggregate and render a whole series as a text block
pub fn render_forecast(samples: &[Sample], zone: FixedOffset) -> String {
    let summaries = aggregate(samples, zone);
    if summaries.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }

    summaries
        .iter()
        .map(DaySummary::render)
        .collect::<Vec<_>>()
        .join("\n")
}
