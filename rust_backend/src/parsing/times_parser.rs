use anyhow::Context;
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::error::{AptxError, AptxResult};
use crate::parsing::fields::{field, is_data_line, missing_header};

const OBSERVATION_HEADER: &str = "* Observation ";

/// Observation totals line (2 words).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationTime {
    pub obsnum: u32,
    pub scidur: i64,
    pub tcharge: i64,
}

/// Visit overheads line (9 fields once parentheses are removed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitTime {
    pub obsnum: u32,
    pub visnum: u32,
    pub pdist: f64,
    pub scidur: i64,
    pub instoh: i64,
    pub sam: i64,
    pub tslew: i64,
    pub obsoh: i64,
    pub schedoh: i64,
    pub tcharge: i64,
}

/// Exposure timing line (16 words).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureTime {
    pub obsnum: u32,
    pub expnum: i64,
    pub subarr: String,
    pub readout: String,
    pub tframe: f64,
    pub ngroup: i64,
    pub nframe: i64,
    pub grpgap: i64,
    pub nint: i64,
    pub tphotc: f64,
    pub ndith: i64,
    pub pdith: i64,
    pub sdith: i64,
    pub nexp: i64,
    pub tphot: f64,
    pub expdur: i64,
    pub exping: i64,
}

/// Everything parsed from one `.times` export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimesReport {
    pub observations: Vec<ObservationTime>,
    pub visits: Vec<VisitTime>,
    pub exposures: Vec<ExposureTime>,
}

/// Parse a `.times` export file.
pub fn parse_times_file(path: &Path) -> anyhow::Result<TimesReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read times file: {}", path.display()))?;

    parse_times_str(&content)
        .with_context(|| format!("Failed to parse times file: {}", path.display()))
}

/// Parse `.times` export text.
///
/// `* Observation N` lines set the current observation. Numeric-led lines
/// are classified by word count: 2 for observation totals, 16 for
/// exposures, more than 9 for visits.
pub fn parse_times_str(content: &str) -> AptxResult<TimesReport> {
    let mut obsnum: Option<u32> = None;
    let mut report = TimesReport::default();

    for line in content.lines() {
        if line.starts_with(OBSERVATION_HEADER) {
            let words: Vec<&str> = line.split_whitespace().collect();
            obsnum = Some(field(&words, words.len() - 1, "obsnum", line)?);
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if !is_data_line(&words) {
            continue;
        }

        let current = || obsnum.ok_or_else(|| missing_header(line, OBSERVATION_HEADER.trim()));

        match words.len() {
            2 => report.observations.push(ObservationTime {
                obsnum: current()?,
                scidur: field(&words, 0, "scidur", line)?,
                tcharge: field(&words, 1, "tcharge", line)?,
            }),
            16 => report.exposures.push(parse_exposure(current()?, &words, line)?),
            n if n > 9 => {
                let stripped = line.replace(['(', ')'], " ");
                let fields: Vec<&str> = stripped.split_whitespace().collect();
                report.visits.push(parse_visit(current()?, &fields, line)?);
            }
            _ => {}
        }
    }

    log::debug!(
        "Parsed {} observation, {} visit and {} exposure time lines",
        report.observations.len(),
        report.visits.len(),
        report.exposures.len()
    );
    Ok(report)
}

fn parse_visit(obsnum: u32, w: &[&str], line: &str) -> AptxResult<VisitTime> {
    if w.len() != 9 {
        return Err(AptxError::MalformedExport {
            line: line.trim_end().to_string(),
            reason: format!("visit line has {} fields, expected 9", w.len()),
        });
    }

    Ok(VisitTime {
        obsnum,
        visnum: field(w, 0, "visnum", line)?,
        pdist: field(w, 1, "pdist", line)?,
        scidur: field(w, 2, "scidur", line)?,
        instoh: field(w, 3, "instoh", line)?,
        sam: field(w, 4, "sam", line)?,
        tslew: field(w, 5, "tslew", line)?,
        obsoh: field(w, 6, "obsoh", line)?,
        schedoh: field(w, 7, "schedoh", line)?,
        tcharge: field(w, 8, "tcharge", line)?,
    })
}

fn parse_exposure(obsnum: u32, w: &[&str], line: &str) -> AptxResult<ExposureTime> {
    Ok(ExposureTime {
        obsnum,
        expnum: field(w, 0, "expnum", line)?,
        subarr: w[1].to_string(),
        readout: w[2].to_string(),
        tframe: field(w, 3, "tframe", line)?,
        ngroup: field(w, 4, "ngroup", line)?,
        nframe: field(w, 5, "nframe", line)?,
        grpgap: field(w, 6, "grpgap", line)?,
        nint: field(w, 7, "nint", line)?,
        tphotc: field(w, 8, "tphotc", line)?,
        ndith: field(w, 9, "ndith", line)?,
        pdith: field(w, 10, "pdith", line)?,
        sdith: field(w, 11, "sdith", line)?,
        nexp: field(w, 12, "nexp", line)?,
        tphot: field(w, 13, "tphot", line)?,
        expdur: field(w, 14, "expdur", line)?,
        exping: field(w, 15, "exping", line)?,
    })
}

impl TimesReport {
    pub fn observations_dataframe(&self) -> PolarsResult<DataFrame> {
        let o = &self.observations;
        df!(
            "obsnum" => o.iter().map(|r| r.obsnum).collect::<Vec<_>>(),
            "scidur" => o.iter().map(|r| r.scidur).collect::<Vec<_>>(),
            "tcharge" => o.iter().map(|r| r.tcharge).collect::<Vec<_>>(),
        )
    }

    pub fn visits_dataframe(&self) -> PolarsResult<DataFrame> {
        let v = &self.visits;
        df!(
            "obsnum" => v.iter().map(|r| r.obsnum).collect::<Vec<_>>(),
            "visnum" => v.iter().map(|r| r.visnum).collect::<Vec<_>>(),
            "pdist" => v.iter().map(|r| r.pdist).collect::<Vec<_>>(),
            "scidur" => v.iter().map(|r| r.scidur).collect::<Vec<_>>(),
            "instoh" => v.iter().map(|r| r.instoh).collect::<Vec<_>>(),
            "sam" => v.iter().map(|r| r.sam).collect::<Vec<_>>(),
            "tslew" => v.iter().map(|r| r.tslew).collect::<Vec<_>>(),
            "obsoh" => v.iter().map(|r| r.obsoh).collect::<Vec<_>>(),
            "schedoh" => v.iter().map(|r| r.schedoh).collect::<Vec<_>>(),
            "tcharge" => v.iter().map(|r| r.tcharge).collect::<Vec<_>>(),
        )
    }

    pub fn exposures_dataframe(&self) -> PolarsResult<DataFrame> {
        let e = &self.exposures;
        df!(
            "obsnum" => e.iter().map(|r| r.obsnum).collect::<Vec<_>>(),
            "expnum" => e.iter().map(|r| r.expnum).collect::<Vec<_>>(),
            "subarr" => e.iter().map(|r| r.subarr.clone()).collect::<Vec<_>>(),
            "readout" => e.iter().map(|r| r.readout.clone()).collect::<Vec<_>>(),
            "tframe" => e.iter().map(|r| r.tframe).collect::<Vec<_>>(),
            "ngroup" => e.iter().map(|r| r.ngroup).collect::<Vec<_>>(),
            "nframe" => e.iter().map(|r| r.nframe).collect::<Vec<_>>(),
            "grpgap" => e.iter().map(|r| r.grpgap).collect::<Vec<_>>(),
            "nint" => e.iter().map(|r| r.nint).collect::<Vec<_>>(),
            "tphotc" => e.iter().map(|r| r.tphotc).collect::<Vec<_>>(),
            "ndith" => e.iter().map(|r| r.ndith).collect::<Vec<_>>(),
            "pdith" => e.iter().map(|r| r.pdith).collect::<Vec<_>>(),
            "sdith" => e.iter().map(|r| r.sdith).collect::<Vec<_>>(),
            "nexp" => e.iter().map(|r| r.nexp).collect::<Vec<_>>(),
            "tphot" => e.iter().map(|r| r.tphot).collect::<Vec<_>>(),
            "expdur" => e.iter().map(|r| r.expdur).collect::<Vec<_>>(),
            "exping" => e.iter().map(|r| r.exping).collect::<Vec<_>>(),
        )
    }
}
