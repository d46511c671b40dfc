// CSV ingestion and cleaning of the rentals dataset
use furnrec_core::{Error, Field, Record, RecordTable, Result};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Cleaned table plus what was dropped on the way
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: RecordTable,
    /// Data rows read from the file
    pub total_rows: usize,
    /// Rows dropped for a missing required value
    pub dropped_rows: usize,
}

/// Load and clean a CSV file with a header row
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    info!("Loading dataset from {:?}", path);
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Parse and clean CSV from any reader.
///
/// Every required column must be present in the header; extra columns are
/// ignored. Values are trimmed and rows with any empty required value are
/// dropped.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| Error::Dataset(e.to_string()))?.clone();
    let mut columns = [0usize; 7];
    for (slot, field) in columns.iter_mut().zip(Field::ALL) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == field.name())
            .ok_or_else(|| Error::MissingColumn(field.name().to_string()))?;
    }

    let mut records = Vec::new();
    let mut total_rows = 0;
    let mut dropped_rows = 0;

    for row in rdr.records() {
        let row = row.map_err(|e| Error::Dataset(e.to_string()))?;
        total_rows += 1;

        let values: Vec<&str> = columns
            .iter()
            .map(|&c| row.get(c).map(str::trim).unwrap_or(""))
            .collect();
        if values.iter().any(|v| v.is_empty()) {
            dropped_rows += 1;
            continue;
        }

        records.push(Record {
            rental_id: values[0].to_string(),
            apartment_type: values[1].to_string(),
            location: values[2].to_string(),
            renter_type: values[3].to_string(),
            budget_range: values[4].to_string(),
            preferred_style: values[5].to_string(),
            recommended_furniture: values[6].to_string(),
        });
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, "Dropped rows with missing required values");
    }
    info!("After cleaning: {} of {} rows remain", records.len(), total_rows);

    Ok(Dataset {
        records: RecordTable::new(records),
        total_rows,
        dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "rental_id,apartment_type,location,renter_type,budget_range,preferred_style,recommended_furniture";

    #[test]
    fn test_reads_and_trims() {
        let data = format!("{}\nR1, Studio ,Downtown,Student,Low,Minimalist,Sofa bed\n", HEADER);
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.records.get(0).unwrap().apartment_type, "Studio");
        assert_eq!(ds.dropped_rows, 0);
    }

    #[test]
    fn test_drops_incomplete_rows() {
        let data = format!(
            "{}\nR1,Studio,Downtown,Student,Low,Minimalist,Sofa bed\nR2,1BHK,,Family,High,Modern,Desk\nR3,2BHK,Uptown,Family,High,Modern\n",
            HEADER
        );
        let ds = read_csv(data.as_bytes()).unwrap();
        assert_eq!(ds.total_rows, 3);
        assert_eq!(ds.dropped_rows, 2);
        assert_eq!(ds.records.len(), 1);
    }

    #[test]
    fn test_column_order_and_extras() {
        let data = "notes,recommended_furniture,rental_id,apartment_type,location,renter_type,budget_range,preferred_style\n\
                    hi,Desk,R7,Loft,Harbor,Artist,Medium,Industrial\n";
        let ds = read_csv(data.as_bytes()).unwrap();
        let r = ds.records.get(0).unwrap();
        assert_eq!(r.rental_id, "R7");
        assert_eq!(r.recommended_furniture, "Desk");
        assert_eq!(r.preferred_style, "Industrial");
    }

    #[test]
    fn test_missing_column() {
        let data = "rental_id,apartment_type\nR1,Studio\n";
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "location"));
    }
}
