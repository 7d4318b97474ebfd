//! CSV output of a run.
//!
//! Two files are written under [`ReportOptions::output_dir`], both named with the configured
//! prefix:
//!
//! * `compartments.csv`: `t` and the nine compartments at every step;
//! * `display.csv`: the subsampled display series, time in display units, prevalence per
//!   thousand for each disease followed by the nine compartments.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;

use crate::compartment::{Compartment, Disease};
use crate::error::CocircError;
use crate::extract::DisplaySeries;
use crate::log::info;
use crate::series::TimeSeries;

pub const COMPARTMENTS_REPORT: &str = "compartments.csv";
pub const DISPLAY_REPORT: &str = "display.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    #[must_use]
    pub fn new() -> Self {
        ReportOptions::default()
    }

    /// Sets the file prefix option (e.g., "lockdown_")
    pub fn file_prefix(&mut self, file_prefix: String) -> &mut ReportOptions {
        self.file_prefix = file_prefix;
        self
    }

    /// Sets the directory where reports will be output
    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.output_dir = directory;
        self
    }

    /// Sets whether to overwrite existing reports of the same name if they exist
    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.file_prefix, name))
    }
}

/// One row of the display report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(non_snake_case)]
struct DisplayRecord {
    x: f64,
    new_cases_1: f64,
    new_cases_2: f64,
    SS: f64,
    SI: f64,
    SR: f64,
    IS: f64,
    II: f64,
    IR: f64,
    RS: f64,
    RI: f64,
    RR: f64,
}

impl DisplayRecord {
    fn new(display: &DisplaySeries, i: usize) -> Self {
        use Compartment as C;
        let y = |c: Compartment| display.compartment(c)[i].y;
        DisplayRecord {
            x: display.new_cases(Disease::One)[i].x,
            new_cases_1: display.new_cases(Disease::One)[i].y,
            new_cases_2: display.new_cases(Disease::Two)[i].y,
            SS: y(C::SS),
            SI: y(C::SI),
            SR: y(C::SR),
            IS: y(C::IS),
            II: y(C::II),
            IR: y(C::IR),
            RS: y(C::RS),
            RI: y(C::RI),
            RR: y(C::RR),
        }
    }
}

fn already_exists(path: &Path) -> CocircError {
    CocircError::ReportError(format!(
        "File already exists: {}. \
         Please set `overwrite` to true in the file options and rerun.",
        path.display()
    ))
}

// Checks that the path is valid and may be written. Creates all parent directories if they
// do not exist. Returns the created file if successful.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, CocircError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if path.exists() && !overwrite {
                return Err(already_exists(path));
            }
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(CocircError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

fn write_rows<T, I>(path: &Path, overwrite: bool, rows: I) -> Result<(), CocircError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = generate_validate_filepath(path, overwrite)?;
    let mut writer = Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes every sample of `series`. Returns the path of the written file.
///
/// # Errors
///
/// Returns `CocircError::ReportError` if the file exists and overwriting is off, and
/// I/O or CSV errors otherwise.
pub fn write_compartments(
    options: &ReportOptions,
    series: &TimeSeries,
) -> Result<PathBuf, CocircError> {
    let path = options.path_for(COMPARTMENTS_REPORT);
    write_rows(&path, options.overwrite, series.records())?;
    info!("wrote {} rows to {}", series.len(), path.display());
    Ok(path)
}

/// Writes the display series. Returns the path of the written file.
///
/// # Errors
///
/// Same as [`write_compartments`].
pub fn write_display(
    options: &ReportOptions,
    display: &DisplaySeries,
) -> Result<PathBuf, CocircError> {
    let path = options.path_for(DISPLAY_REPORT);
    write_rows(
        &path,
        options.overwrite,
        (0..display.len()).map(|i| DisplayRecord::new(display, i)),
    )?;
    info!("wrote {} rows to {}", display.len(), path.display());
    Ok(path)
}

/// Checks that neither report exists yet, unless overwriting is allowed. Run this before a
/// long integration so a clash is reported early.
///
/// # Errors
///
/// Returns `CocircError::ReportError` naming the first existing file.
pub fn check_outputs(options: &ReportOptions) -> Result<(), CocircError> {
    if options.overwrite {
        return Ok(());
    }
    for name in [COMPARTMENTS_REPORT, DISPLAY_REPORT] {
        let path = options.path_for(name);
        if path.exists() {
            return Err(already_exists(&path));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::State;
    use crate::extract::{extract, ExtractOptions};
    use crate::integrator::Integrator;
    use crate::model::EpidemicModel;
    use std::fs;
    use tempfile::tempdir;

    fn short_series() -> TimeSeries {
        Integrator::default()
            .run(&EpidemicModel::default(), State::seeded(0.01, 0.0), 20.0)
            .unwrap()
    }

    fn options_in(dir: &Path) -> ReportOptions {
        let mut options = ReportOptions::new();
        options
            .directory(dir.to_path_buf())
            .file_prefix("test_".to_string());
        options
    }

    #[test]
    fn compartments_report_has_one_row_per_sample() {
        let temp_dir = tempdir().unwrap();
        let options = options_in(temp_dir.path());
        let series = short_series();
        let path = write_compartments(&options, &series).unwrap();
        assert_eq!(path, temp_dir.path().join("test_compartments.csv"));

        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, TimeSeries::column_names());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[20][0].parse::<f64>().unwrap(), 20.0);
        assert_eq!(rows[0][4].parse::<f64>().unwrap(), 0.01);
    }

    #[test]
    fn display_report_columns() {
        let temp_dir = tempdir().unwrap();
        let options = options_in(&temp_dir.path().join("nested").join("dir"));
        let display = extract(&short_series(), &ExtractOptions::default()).unwrap();
        let path = write_display(&options, &display).unwrap();
        assert!(path.exists(), "CSV file should exist");

        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers[..3], ["x", "new_cases_1", "new_cases_2"]);
        assert_eq!(headers.len(), 12);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1].parse::<f64>().unwrap(), 10.0);
    }

    #[test]
    fn existing_file_is_kept_without_overwrite() {
        let temp_dir = tempdir().unwrap();
        let mut options = options_in(temp_dir.path());
        let existing = options.path_for(COMPARTMENTS_REPORT);
        fs::write(&existing, "keep me").unwrap();

        assert!(matches!(
            check_outputs(&options),
            Err(CocircError::ReportError(_))
        ));
        let err = write_compartments(&options, &short_series()).unwrap_err();
        assert!(matches!(err, CocircError::ReportError(_)));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");

        options.overwrite(true);
        check_outputs(&options).unwrap();
        write_compartments(&options, &short_series()).unwrap();
        assert!(fs::read_to_string(&existing).unwrap().starts_with("t,SS"));
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let err = generate_validate_filepath(&temp_dir.path().join("report.tsv"), true)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Report output files must be CSVs at this time"
        );
    }
}
