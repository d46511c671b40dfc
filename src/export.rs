//! Rendering recommendations for the command line: aligned table, JSON or CSV.

use furnrec_core::{Error, Listing, Result};
use furnrec_similarity::Recommendation;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

fn csv_error(e: csv::Error) -> Error {
    Error::Serialization(e.to_string())
}

/// Write recommendations as CSV with a header row
pub fn write_csv<W: Write>(writer: W, recommendations: &[Recommendation]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header: Vec<&str> = Listing::COLUMNS.iter().map(|f| f.name()).collect();
    header.push("score");
    wtr.write_record(&header).map_err(csv_error)?;

    for rec in recommendations {
        let score = format!("{:.4}", rec.score);
        let mut row: Vec<&str> = rec.listing.values().to_vec();
        row.push(&score);
        wtr.write_record(&row).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write recommendations as a plain aligned table
pub fn write_table<W: Write>(mut writer: W, recommendations: &[Recommendation]) -> Result<()> {
    let mut rows: Vec<Vec<String>> = vec![Listing::COLUMNS
        .iter()
        .map(|f| f.name().to_string())
        .chain(std::iter::once("score".to_string()))
        .collect()];
    for rec in recommendations {
        let mut row: Vec<String> = rec.listing.values().iter().map(|v| v.to_string()).collect();
        row.push(format!("{:.4}", rec.score));
        rows.push(row);
    }

    let widths: Vec<usize> = (0..rows[0].len())
        .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
        .collect();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
            .collect();
        writeln!(writer, "{}", line.join("  ").trim_end())?;
    }
    Ok(())
}

pub fn write<W: Write>(
    mut writer: W,
    format: OutputFormat,
    recommendations: &[Recommendation],
) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(writer, recommendations),
        OutputFormat::Csv => write_csv(writer, recommendations),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, recommendations)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            writeln!(writer)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recs() -> Vec<Recommendation> {
        vec![Recommendation {
            listing: Listing {
                apartment_type: "Studio".to_string(),
                location: "Downtown".to_string(),
                budget_range: "Low".to_string(),
                preferred_style: "Minimalist".to_string(),
                recommended_furniture: "Sofa, bed".to_string(),
            },
            score: 0.5,
        }]
    }

    #[test]
    fn test_csv_quotes_and_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &recs()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "apartment_type,location,budget_range,preferred_style,recommended_furniture,score\n\
             Studio,Downtown,Low,Minimalist,\"Sofa, bed\",0.5000\n"
        );
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let mut out = Vec::new();
        write_table(&mut out, &recs()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("apartment_type"));
        assert!(lines[1].contains("Sofa, bed"));
    }

    #[test]
    fn test_json() {
        let mut out = Vec::new();
        write(&mut out, OutputFormat::Json, &recs()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["recommended_furniture"], "Sofa, bed");
        assert_eq!(value[0]["score"], 0.5);
    }
}
