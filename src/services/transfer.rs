//! CSV encoding and decoding shared by every import/export endpoint

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

/// Serialize rows to CSV with a header line
pub fn to_csv<T: Serialize>(rows: &[T]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))
}

/// One decoded row; `row` is 1-based and does not count the header
#[derive(Debug)]
pub struct CsvRow<T> {
    pub row: usize,
    pub record: Result<T, String>,
}

/// Decode every row of an uploaded CSV file. A malformed header fails the
/// whole file; a malformed row only fails that row.
pub fn parse_csv<T: DeserializeOwned>(content: &[u8]) -> AppResult<Vec<CsvRow<T>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Invalid CSV header: {}", e)))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(AppError::BadRequest("CSV file is empty".to_string()));
    }

    Ok(reader
        .records()
        .enumerate()
        .map(|(i, record)| CsvRow {
            row: i + 1,
            record: record
                .and_then(|r| r.deserialize::<T>(Some(&headers)))
                .map_err(|e| e.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{category::CreateCategory, enums::RecordStatus, material::CreateMaterial};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_export_has_header_and_enum_slugs() {
        let rows = vec![CreateCategory {
            name: "Power tools".to_string(),
            description: None,
            status: Some(RecordStatus::Inactive),
        }];
        let csv = String::from_utf8(to_csv(&rows).unwrap()).unwrap();
        assert_eq!(csv, "name,description,status\nPower tools,,inactive\n");
    }

    #[test]
    fn test_import_reports_bad_rows_individually() {
        let content = b"code,name,category_id,quantity,unit_price\n\
            DRL-1,Drill,3,5,12.50\n\
            SAW-1,Saw,not-a-number,1,\n\
            HAM-1, Hammer ,2,,\n";
        let rows = parse_csv::<CreateMaterial>(content).unwrap();
        assert_eq!(rows.len(), 3);

        let drill = rows[0].record.as_ref().unwrap();
        assert_eq!(drill.category_id, 3);
        assert_eq!(drill.unit_price, Some(Decimal::from_str("12.5").unwrap()));

        assert_eq!(rows[1].row, 2);
        assert!(rows[1].record.is_err());

        let hammer = rows[2].record.as_ref().unwrap();
        assert_eq!(hammer.name, "Hammer");
        assert_eq!(hammer.quantity, None);
    }

    #[test]
    fn test_import_ignores_unknown_columns() {
        let content = b"id,name,status,created_at\n7,Fasteners,active,2025-01-01T00:00:00Z\n";
        let rows = parse_csv::<CreateCategory>(content).unwrap();
        let category = rows[0].record.as_ref().unwrap();
        assert_eq!(category.name, "Fasteners");
        assert_eq!(category.status, Some(RecordStatus::Active));
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(
            parse_csv::<CreateCategory>(b""),
            Err(AppError::BadRequest(_))
        ));
    }
}
