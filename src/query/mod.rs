mod parser;

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;
use anyhow::Context;
use chrono::{Datelike, NaiveDate, NaiveTime};
use log::{debug, info};
use rusqlite::{params, OptionalExtension};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use crate::db::Database;

pub(crate) use parser::parse_query;

/// Timestamp format of `records.date`
const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryError {
    reason: String,
}

impl QueryError {
    pub(crate) fn new(reason: &str) -> QueryError {
        QueryError { reason: reason.to_string() }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid query file: {}", self.reason)
    }
}

impl std::error::Error for QueryError {}

/// Chart definition: one series per field, each computed by running `sql` with
/// `(field, window start, window end)` as parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartQuery {
    pub(crate) fields: Vec<String>,
    pub(crate) sql: String,
}

impl ChartQuery {
    pub(crate) fn load(file_path: &Path) -> anyhow::Result<ChartQuery> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Unable to read query file {}", file_path.display()))?;
        let query = parse_query(&content)
            .with_context(|| format!("Unable to load {}", file_path.display()))?;
        info!("Loaded query with fields {:?}", query.fields);
        Ok(query)
    }
}

/// Aggregated values of one date window, labelled by the year and month the window starts in
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bucket {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) values: Vec<f64>,
}

/// Serialized as a flat array `[year, month, value, ...]`
impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2 + self.values.len()))?;
        seq.serialize_element(&self.year)?;
        seq.serialize_element(&self.month)?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// Run the chart query for every field in every window. Sums are stored in kopecks,
/// values are returned in roubles rounded to 2 decimals.
pub(crate) fn aggregate(db: &Database, query: &ChartQuery, windows: &[Range<NaiveDate>]) -> anyhow::Result<Vec<Bucket>> {
    let mut stmt = db.connection().prepare(&query.sql).context("Unable to prepare chart query")?;

    let mut buckets = vec![];
    for window in windows {
        let start = midnight(window.start);
        let end = midnight(window.end);

        let mut values = vec![];
        for field in &query.fields {
            let total = stmt.query_row(params![field, start, end], |row| row.get::<_, Option<f64>>(0))
                .optional()
                .with_context(|| format!("Chart query failed for '{}'", field))?
                .flatten();
            debug!("{}..{} {}: {:?}", start, end, field, total);
            values.push(total.unwrap_or(0.0).round() / 100.0);
        }

        buckets.push(Bucket { year: window.start.year(), month: window.start.month(), values });
    }

    Ok(buckets)
}

fn midnight(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).format(SQL_DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::backup::tests::{fixture_backup, fixture_filename};
    use crate::db::Database;
    use crate::query::{aggregate, Bucket, ChartQuery};
    use crate::window::{windows, Mode};

    fn fixture_database() -> Database {
        let mut db = Database::open(None).unwrap();
        db.create_schema().unwrap();
        db.load(&fixture_backup()).unwrap();
        db
    }

    #[test]
    fn test_load_fixture() {
        let query = ChartQuery::load(&fixture_filename("expenses.sql")).unwrap();
        assert_eq!(query.fields, vec!["Продукты", "Транспорт"]);
        assert!(query.sql.starts_with("SELECT -SUM(r.sum)"));

        let err = ChartQuery::load(&fixture_filename("no_fields.sql")).unwrap_err();
        assert!(format!("{:#}", err).contains("no fields in header"));
    }

    #[test]
    fn test_aggregate_by_month() {
        let db = fixture_database();
        let query = ChartQuery::load(&fixture_filename("expenses.sql")).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();

        let buckets = aggregate(&db, &query, &windows(Mode::Month, 4, today).unwrap()).unwrap();
        assert_eq!(buckets, vec![
            Bucket { year: 2024, month: 3, values: vec![1500.0, 450.0] },
            Bucket { year: 2024, month: 2, values: vec![2300.0, 0.0] },
            Bucket { year: 2024, month: 1, values: vec![0.0, 0.0] },
            Bucket { year: 2023, month: 12, values: vec![999.0, 0.0] },
        ]);
    }

    #[test]
    fn test_aggregate_by_year() {
        let db = fixture_database();
        let query = ChartQuery::load(&fixture_filename("expenses.sql")).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let buckets = aggregate(&db, &query, &windows(Mode::Year, 2, today).unwrap()).unwrap();
        assert_eq!(buckets[0], Bucket { year: 2024, month: 1, values: vec![3800.0, 450.0] });
        assert_eq!(buckets[1], Bucket { year: 2023, month: 1, values: vec![999.0, 0.0] });

        // Window ends at the start of tomorrow, the 2024-03-20 record is excluded
        let buckets = aggregate(&db, &query, &windows(Mode::YearToDate, 1, today).unwrap()).unwrap();
        assert_eq!(buckets, vec![Bucket { year: 2024, month: 1, values: vec![3800.0, 0.0] }]);
    }

    #[test]
    fn test_aggregate_rounding() {
        let db = fixture_database();
        let query = ChartQuery {
            fields: vec!["x".to_string()],
            sql: "SELECT 123456.7 + length(?) * 0 + length(?) * 0 + length(?) * 0".to_string(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let buckets = aggregate(&db, &query, &windows(Mode::Month, 1, today).unwrap()).unwrap();
        assert_eq!(buckets[0].values, vec![1234.57]);
    }

    #[test]
    fn test_aggregate_invalid_sql() {
        let db = fixture_database();
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let windows = windows(Mode::Month, 1, today).unwrap();

        let query = ChartQuery { fields: vec!["x".to_string()], sql: "SELECT FROM nowhere".to_string() };
        assert!(aggregate(&db, &query, &windows).is_err());

        // Wrong number of parameters
        let query = ChartQuery { fields: vec!["x".to_string()], sql: "SELECT ?".to_string() };
        assert!(aggregate(&db, &query, &windows).is_err());
    }

    #[test]
    fn test_bucket_json() {
        let bucket = Bucket { year: 2024, month: 3, values: vec![1500.0, 0.25] };
        assert_eq!(serde_json::to_string(&bucket).unwrap(), "[2024,3,1500.0,0.25]");
    }
}
