use crate::core::met_history::{MetChannel, MetHistory};
use crate::errors::InputError;
use csv::ReaderBuilder as CsvReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use strum::EnumCount;
use tracing::debug;

const COLUMN_ELAPSED_TIME: usize = 0;
const EXPECTED_COLUMNS: usize = MetChannel::COUNT + 1;

pub fn met_history_from_file(path: &Path) -> Result<MetHistory, InputError> {
    let file = File::open(path).map_err(|source| InputError::MetHistoryUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    met_history_from_reader(BufReader::new(file))
}

/// Read the meteorological history: elapsed time in s, then one column per channel in
/// [`MetChannel`] order. A single header row, as written by the input generator, is skipped.
/// Extra trailing columns are ignored. Row numbers in errors count from 1 and include the
/// header.
pub fn met_history_from_reader(file: impl Read) -> Result<MetHistory, InputError> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut times: Vec<f64> = vec![];
    let mut channels: Vec<Vec<f64>> = vec![vec![]; MetChannel::COUNT];

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|source| InputError::MetCsv { row, source })?;

        if i == 0 && is_header(&record) {
            debug!("skipping header row of meteorological history");
            continue;
        }
        if record.len() < EXPECTED_COLUMNS {
            return Err(InputError::TooFewColumns {
                row,
                found: record.len(),
                expected: EXPECTED_COLUMNS,
            });
        }

        let values = record
            .iter()
            .take(EXPECTED_COLUMNS)
            .enumerate()
            .map(|(column, field)| parse_field(field, row, column + 1))
            .collect::<Result<Vec<f64>, _>>()?;

        let time = values[COLUMN_ELAPSED_TIME];
        if let Some(&previous) = times.last() {
            if time <= previous {
                return Err(InputError::NonIncreasingTime {
                    row,
                    previous,
                    current: time,
                });
            }
        }
        times.push(time);
        for (channel, value) in channels.iter_mut().zip(&values[1..]) {
            channel.push(*value);
        }
    }

    if times.len() < 2 {
        return Err(InputError::TooFewRows { found: times.len() });
    }
    debug!(
        "read {} meteorological samples from t = {} s to t = {} s",
        times.len(),
        times[0],
        times[times.len() - 1]
    );

    Ok(MetHistory::new(times, channels))
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(COLUMN_ELAPSED_TIME)
        .is_some_and(|field| field.parse::<f64>().is_err())
}

fn parse_field(field: &str, row: usize, column: usize) -> Result<f64, InputError> {
    field
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InputError::NonNumericField {
            row,
            column,
            value: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::met_history::MetSource;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    const HEADER: &str = "elapsed,temp,temp_sky,temp_ground,poai,dni,wind_speed,\
        elevation_projected,abs_glass,abs_encapsulant,abs_cell,current_factor";

    fn row(time: f64, temp: f64) -> String {
        format!("{time},{temp},260,285,800,600,2.5,0.6,40,10,700,0.95")
    }

    #[fixture]
    fn met_csv() -> String {
        [
            HEADER.to_string(),
            row(3600., 280.),
            row(7200., 284.),
            row(10800., 290.),
        ]
        .join("\n")
    }

    #[rstest]
    fn test_reads_history_after_header(met_csv: String) {
        let history = met_history_from_reader(Cursor::new(met_csv)).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.times(), &[3600., 7200., 10800.]);
        assert_eq!(history.channel(MetChannel::Temp), &[280., 284., 290.]);
        assert_eq!(history.channel(MetChannel::CurrentFactor), &[0.95; 3]);
        assert_relative_eq!(history.value(MetChannel::Temp, 5400.), 282.);
    }

    #[rstest]
    fn test_reads_history_without_header() {
        let csv = [row(0., 280.), row(3600., 281.)].join("\n");

        assert_eq!(met_history_from_reader(Cursor::new(csv)).unwrap().len(), 2);
    }

    #[rstest]
    fn test_rejects_short_row() {
        let csv = [row(0., 280.), "3600,281,260".to_string()].join("\n");

        assert!(matches!(
            met_history_from_reader(Cursor::new(csv)),
            Err(InputError::TooFewColumns {
                row: 2,
                found: 3,
                expected: 12
            })
        ));
    }

    #[rstest]
    fn test_rejects_non_numeric_field() {
        let csv = [row(0., 280.), "3600,warm,260,285,800,600,2.5,0.6,40,10,700,0.95".to_string()]
            .join("\n");

        assert!(matches!(
            met_history_from_reader(Cursor::new(csv)),
            Err(InputError::NonNumericField { row: 2, column: 2, value }) if value == "warm"
        ));
    }

    #[rstest]
    fn test_rejects_single_row() {
        let csv = [HEADER.to_string(), row(3600., 280.)].join("\n");

        assert!(matches!(
            met_history_from_reader(Cursor::new(csv)),
            Err(InputError::TooFewRows { found: 1 })
        ));
    }

    #[rstest]
    fn test_rejects_time_going_backwards() {
        let csv = [row(7200., 280.), row(3600., 281.)].join("\n");

        assert!(matches!(
            met_history_from_reader(Cursor::new(csv)),
            Err(InputError::NonIncreasingTime { row: 2, .. })
        ));
    }

    #[rstest]
    fn test_missing_file_names_path() {
        let error = met_history_from_file(Path::new("/nonexistent/TOMCAT_input.csv")).unwrap_err();

        assert!(error.to_string().contains("/nonexistent/TOMCAT_input.csv"));
    }
}
