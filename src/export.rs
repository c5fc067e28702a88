use crate::{error::ToeholdError, pipeline::AnalysisReport};
use csv::WriterBuilder;
use serde::Serialize;
use std::{fs::File, io::Write};

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: usize,
    offset: usize,
    target: &'a str,
    toehold: &'a str,
    spacer: Option<char>,
    accessibility: f64,
    defect: f64,
    score: f64,
}

/// Writes the ranked candidate table as CSV, one row per candidate.
pub fn write_ranked_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<(), ToeholdError> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in report.records() {
        let row = CsvRow {
            rank: record.rank,
            offset: record.offset,
            target: &record.target,
            toehold: &record.toehold,
            spacer: record.spacer,
            accessibility: record.accessibility,
            defect: record.defect,
            score: record.score,
        };
        wtr.serialize(row).map_err(|e| ToeholdError::Io {
            message: format!("Could not write CSV row: {e}"),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_ranked_csv(report: &AnalysisReport, path: &str) -> Result<(), ToeholdError> {
    let file = File::create(path).map_err(|e| ToeholdError::Io {
        message: format!("Could not create CSV file '{path}': {e}"),
    })?;
    write_ranked_csv(report, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{accessibility::FixedProfile, config::ToeholdConfig, pipeline::AnalysisPipeline};

    #[test]
    fn test_csv_rows_follow_ranking() {
        let report = AnalysisPipeline::new(
            ToeholdConfig::default(),
            FixedProfile::new(vec![0.0, 0.0, 1.0, 1.0, 1.0]).unwrap(),
        )
        .unwrap()
        .analyze("ACGUA", 3)
        .unwrap();
        let mut buffer = Vec::new();
        write_ranked_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "rank,offset,target,toehold,spacer,accessibility,defect,score"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,2,GUA,"));
        assert!(lines[3].starts_with("3,0,ACG,"));
    }
}
