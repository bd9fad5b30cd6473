// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route sheet import.
//!
//! Route sheets are CSV files exported from a Japanese spreadsheet, so they
//! arrive Shift_JIS encoded. Each row describes one stop:
//!
//! | col | field              | col | field         |
//! |-----|--------------------|-----|---------------|
//! | 0   | course name        | 9   | status note   |
//! | 1   | sequence label     | 10  | (unused)      |
//! | 2   | scheduled `HH:MM`  | 11  | phone number  |
//! | 3   | stop name          | 12  | note 1        |
//! | 4   | address            | 13  | note 2        |
//! | 5   | latitude           | 14  | note 3        |
//! | 6   | longitude          | 15  | desired start |
//! | 7   | stay minutes       | 16  | desired end   |
//! | 8   | weight (kg)        |     |               |
//!
//! Rows with fewer than [`REQUIRED_COLUMNS`] fields are dropped. Numeric
//! cells that fail to parse count as zero, and zero means "absent".

use crate::models::{Coordinates, StopRecord};
use crate::time_utils::ClockTime;
use std::borrow::Cow;
use std::collections::HashMap;

/// Number of columns a row needs to be imported.
pub const REQUIRED_COLUMNS: usize = 17;

/// Sequence label of the depot row that precedes the first real stop.
pub const DEPARTURE_MARKER: &str = "出発";

/// Errors from reading a route sheet.
#[derive(Debug, thiserror::Error)]
pub enum RouteImportError {
    #[error("Failed to read header row: {0}")]
    Header(String),

    #[error("Failed to read CSV record {record}: {message}")]
    Record { record: usize, message: String },

    #[error("CSV file contains no data")]
    Empty,

    #[error("No rows left after filtering")]
    EmptyAfterFiltering,
}

/// Post-processing applied after parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub has_header: bool,
    /// Remove rows labelled [`DEPARTURE_MARKER`]
    pub skip_departure: bool,
    /// Translate every course so its first stop is scheduled at this time
    pub start_time: Option<ClockTime>,
}

/// Decode Shift_JIS bytes. A UTF-8 byte order mark switches to UTF-8.
pub fn decode_shift_jis(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
    if had_errors {
        tracing::warn!("Route sheet contained bytes that are not valid Shift_JIS");
    }
    text
}

/// Parse decoded CSV text into stop records, in file order.
pub fn parse_records(text: &str, has_header: bool) -> Result<Vec<StopRecord>, RouteImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = reader.records();
    if has_header {
        if let Some(header) = rows.next() {
            header.map_err(|e| RouteImportError::Header(e.to_string()))?;
        }
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (i, row) in rows.enumerate() {
        let row = row.map_err(|e| RouteImportError::Record {
            record: i + 1,
            message: e.to_string(),
        })?;

        if row.len() < REQUIRED_COLUMNS {
            dropped += 1;
            continue;
        }

        let field = |idx: usize| row.get(idx).unwrap_or_default().trim_start();
        records.push(StopRecord {
            course_name: field(0).to_string(),
            sequence: field(1).to_string(),
            scheduled_arrival: text_cell(field(2)),
            stop_name: field(3).to_string(),
            address: text_cell(field(4)),
            coordinates: coordinates_cell(field(5), field(6)),
            stay_minutes: u32::try_from(integer_cell(field(7)))
                .ok()
                .filter(|m| *m != 0),
            weight_kg: Some(integer_cell(field(8))).filter(|w| *w != 0),
            status_note: text_cell(field(9)),
            phone_number: text_cell(field(11)),
            note1: text_cell(field(12)),
            note2: text_cell(field(13)),
            note3: text_cell(field(14)),
            desired_time_start: text_cell(field(15)),
            desired_time_end: text_cell(field(16)),
        });
    }

    if dropped > 0 {
        tracing::warn!(
            dropped,
            required = REQUIRED_COLUMNS,
            "Dropped route rows with too few columns"
        );
    }
    Ok(records)
}

/// Decode, parse, and post-process a raw route sheet.
///
/// Fails if the sheet has no usable rows, before or after filtering.
pub fn import(bytes: &[u8], options: ImportOptions) -> Result<Vec<StopRecord>, RouteImportError> {
    let text = decode_shift_jis(bytes);
    let mut records = parse_records(&text, options.has_header)?;
    if records.is_empty() {
        return Err(RouteImportError::Empty);
    }

    if options.skip_departure {
        records = drop_departure_rows(records);
    }
    if let Some(start) = options.start_time {
        shift_to_start(&mut records, start);
    }
    if records.is_empty() {
        return Err(RouteImportError::EmptyAfterFiltering);
    }
    Ok(records)
}

/// Remove depot rows whose sequence label is [`DEPARTURE_MARKER`].
pub fn drop_departure_rows(records: Vec<StopRecord>) -> Vec<StopRecord> {
    records
        .into_iter()
        .filter(|r| r.sequence != DEPARTURE_MARKER)
        .collect()
}

/// Shift each course so its first row is scheduled at `new_start`.
///
/// Every row in a course moves by the same offset, wrapping around midnight.
/// A course whose first row has no parsable time is left alone, as is any
/// individual row whose time does not parse.
pub fn shift_to_start(records: &mut [StopRecord], new_start: ClockTime) {
    let mut offsets: HashMap<String, Option<i32>> = HashMap::new();

    for record in records.iter_mut() {
        let scheduled = record
            .scheduled_arrival
            .as_deref()
            .and_then(|t| t.parse::<ClockTime>().ok());

        let offset = *offsets
            .entry(record.course_name.clone())
            .or_insert_with(|| {
                scheduled.map(|original| new_start.minutes_of_day() - original.minutes_of_day())
            });

        if let (Some(offset), Some(scheduled)) = (offset, scheduled) {
            record.scheduled_arrival = Some(scheduled.shifted(offset).to_string());
        }
    }
}

fn text_cell(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn integer_cell(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}

/// Zero (or unparsable) in either axis means the stop has no location.
fn coordinates_cell(lat: &str, lng: &str) -> Option<Coordinates> {
    let latitude: f64 = lat.parse().unwrap_or(0.0);
    let longitude: f64 = lng.parse().unwrap_or(0.0);
    (latitude != 0.0 && longitude != 0.0).then(|| Coordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(course: &str, seq: &str, time: &str, name: &str) -> String {
        format!(
            "{course},{seq},{time},{name},Tokyo,35.68,139.76,15,120,,x,03-0000-0000,n1,,,09:00,10:00"
        )
    }

    #[test]
    fn test_parse_full_row() {
        let records = parse_records(&row("A", "1", "09:00", "Depot"), false).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.course_name, "A");
        assert_eq!(r.scheduled_arrival.as_deref(), Some("09:00"));
        assert_eq!(r.coordinates, Some(Coordinates::new(35.68, 139.76)));
        assert_eq!(r.stay_minutes, Some(15));
        assert_eq!(r.weight_kg, Some(120));
        assert_eq!(r.status_note, None);
        assert_eq!(r.phone_number.as_deref(), Some("03-0000-0000"));
        assert_eq!(r.note1.as_deref(), Some("n1"));
        assert_eq!(r.note2, None);
        assert_eq!(r.desired_time_end.as_deref(), Some("10:00"));
    }

    #[test]
    fn test_short_row_is_dropped() {
        let short = "A,2,09:30,Shop,Tokyo,35.6,139.7,0,0,,,,,,,09:00";
        assert_eq!(short.split(',').count(), 16);
        let text = format!("{}\n{}\n{}\n", row("A", "1", "09:00", "a"), short, row("A", "3", "10:00", "c"));

        let records = parse_records(&text, false).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.stop_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_header_row_is_skipped() {
        let header = (0..17).map(|i| format!("h{i}")).collect::<Vec<_>>().join(",");
        let text = format!("{header}\n{}\n", row("A", "1", "09:00", "a"));
        assert_eq!(parse_records(&text, true).unwrap().len(), 1);
        assert_eq!(parse_records(&text, false).unwrap().len(), 2);
    }

    #[test]
    fn test_lenient_numeric_cells() {
        let text = "A,1,09:00,a, addr ,abc,139.7,ten,-,,,,,,,,";
        let records = parse_records(text, false).unwrap();
        let r = &records[0];
        assert_eq!(r.address.as_deref(), Some("addr "));
        assert_eq!(r.coordinates, None);
        assert_eq!(r.stay_minutes, None);
        assert_eq!(r.weight_kg, None);
        assert_eq!(r.desired_time_end, None);
    }

    #[test]
    fn test_shift_jis_import_with_departure_filter() {
        let text = format!(
            "{}\n{}\n",
            row("便1", DEPARTURE_MARKER, "08:30", "倉庫"),
            row("便1", "1", "09:00", "店舗")
        );
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(&text);

        let all = import(&bytes, ImportOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].course_name, "便1");
        assert_eq!(all[0].stop_name, "倉庫");

        let filtered = import(
            &bytes,
            ImportOptions {
                skip_departure: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].stop_name, "店舗");
    }

    #[test]
    fn test_import_rejects_empty_results() {
        assert!(matches!(
            import(b"", ImportOptions::default()),
            Err(RouteImportError::Empty)
        ));

        let only_depot = row("A", DEPARTURE_MARKER, "08:00", "depot");
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(&only_depot);
        let options = ImportOptions {
            skip_departure: true,
            ..Default::default()
        };
        assert!(matches!(
            import(&bytes, options),
            Err(RouteImportError::EmptyAfterFiltering)
        ));
    }

    fn timed(course: &str, time: Option<&str>) -> StopRecord {
        StopRecord {
            course_name: course.to_string(),
            scheduled_arrival: time.map(str::to_string),
            ..Default::default()
        }
    }

    fn times(records: &[StopRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.scheduled_arrival.as_deref()).collect()
    }

    #[test]
    fn test_shift_per_course_with_wrap() {
        let mut records = vec![
            timed("A", Some("09:00")),
            timed("B", Some("22:00")),
            timed("A", Some("23:30")),
            timed("B", Some("bad")),
            timed("B", Some("23:00")),
        ];
        shift_to_start(&mut records, "10:00".parse().unwrap());
        assert_eq!(
            times(&records),
            vec![
                Some("10:00"),
                Some("10:00"),
                Some("00:30"),
                Some("bad"),
                Some("11:00")
            ]
        );
    }

    #[test]
    fn test_shift_skips_course_with_unparsable_start() {
        let mut records = vec![timed("A", None), timed("A", Some("09:00"))];
        shift_to_start(&mut records, "06:00".parse().unwrap());
        assert_eq!(times(&records), vec![None, Some("09:00")]);
    }

    #[test]
    fn test_shift_round_trip() {
        let original = vec![
            timed("A", Some("00:10")),
            timed("A", Some("12:45")),
            timed("A", Some("23:59")),
        ];
        let mut records = original.clone();
        shift_to_start(&mut records, "20:00".parse().unwrap());
        shift_to_start(&mut records, "00:10".parse().unwrap());
        assert_eq!(times(&records), times(&original));
    }

    #[test]
    fn test_shift_ignores_out_of_range_times() {
        let mut records = vec![
            timed("A", Some("99999999:00")),
            timed("A", Some("09:00")),
            timed("B", Some("08:00")),
            timed("B", Some("99999999:00")),
        ];
        shift_to_start(&mut records, "10:00".parse().unwrap());
        assert_eq!(
            times(&records),
            vec![
                Some("99999999:00"),
                Some("09:00"),
                Some("10:00"),
                Some("99999999:00")
            ]
        );
    }
}
