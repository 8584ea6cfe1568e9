use anyhow::Context;
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::error::AptxResult;
use crate::parsing::fields::{field, is_data_line, missing_header};

const VISIT_HEADER: &str = "** Visit ";

/// One exposure pointing from a `.pointing` export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointingRecord {
    pub obsnum: u32,
    pub visnum: u32,
    pub targ: i64,
    pub tile: i64,
    pub expnum: i64,
    pub dith: i64,
    pub aperture: String,
    pub targnum: i64,
    pub propname: String,
    pub radeg: f64,
    pub decdeg: f64,
    pub xbase: f64,
    pub ybase: f64,
    pub xdith: f64,
    pub ydith: f64,
    pub v2: f64,
    pub v3: f64,
    pub xidl: f64,
    pub yidl: f64,
    pub level: String,
    pub pointing_type: String,
    pub expar: i64,
    pub dkpar: i64,
    /// Absent on 21-word lines
    pub ddist: Option<f64>,
}

/// Parse a `.pointing` export file.
pub fn parse_pointing_file(path: &Path) -> anyhow::Result<Vec<PointingRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pointing file: {}", path.display()))?;

    parse_pointing_str(&content)
        .with_context(|| format!("Failed to parse pointing file: {}", path.display()))
}

/// Parse `.pointing` export text.
///
/// `** Visit o:v` lines set the current observation and visit. Lines whose
/// first word is numeric and that hold 22 words, or 21 without the trailing
/// `ddist`, are pointings. Everything else is ignored.
pub fn parse_pointing_str(content: &str) -> AptxResult<Vec<PointingRecord>> {
    let mut visit: Option<(u32, u32)> = None;
    let mut records = Vec::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix(VISIT_HEADER) {
            let parts: Vec<&str> = header.trim().split(':').collect();
            visit = Some((
                field(&parts, 0, "obsnum", line)?,
                field(&parts, 1, "visnum", line)?,
            ));
            continue;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        if !is_data_line(&words) || !(words.len() == 21 || words.len() == 22) {
            continue;
        }

        let (obsnum, visnum) = visit.ok_or_else(|| missing_header(line, VISIT_HEADER.trim()))?;
        records.push(PointingRecord {
            obsnum,
            visnum,
            targ: field(&words, 0, "targ", line)?,
            tile: field(&words, 1, "tile", line)?,
            expnum: field(&words, 2, "expnum", line)?,
            dith: field(&words, 3, "dith", line)?,
            aperture: words[4].to_string(),
            targnum: field(&words, 5, "targnum", line)?,
            propname: words[6].to_string(),
            radeg: field(&words, 7, "radeg", line)?,
            decdeg: field(&words, 8, "decdeg", line)?,
            xbase: field(&words, 9, "xbase", line)?,
            ybase: field(&words, 10, "ybase", line)?,
            xdith: field(&words, 11, "xdith", line)?,
            ydith: field(&words, 12, "ydith", line)?,
            v2: field(&words, 13, "v2", line)?,
            v3: field(&words, 14, "v3", line)?,
            xidl: field(&words, 15, "xidl", line)?,
            yidl: field(&words, 16, "yidl", line)?,
            level: words[17].to_string(),
            pointing_type: words[18].to_string(),
            expar: field(&words, 19, "expar", line)?,
            dkpar: field(&words, 20, "dkpar", line)?,
            ddist: if words.len() == 22 {
                Some(field(&words, 21, "ddist", line)?)
            } else {
                None
            },
        });
    }

    log::debug!("Parsed {} pointing records", records.len());
    Ok(records)
}

/// Convert pointing records to a Polars DataFrame
pub fn pointings_to_dataframe(records: &[PointingRecord]) -> PolarsResult<DataFrame> {
    df!(
        "obsnum" => records.iter().map(|r| r.obsnum).collect::<Vec<_>>(),
        "visnum" => records.iter().map(|r| r.visnum).collect::<Vec<_>>(),
        "targ" => records.iter().map(|r| r.targ).collect::<Vec<_>>(),
        "tile" => records.iter().map(|r| r.tile).collect::<Vec<_>>(),
        "expnum" => records.iter().map(|r| r.expnum).collect::<Vec<_>>(),
        "dith" => records.iter().map(|r| r.dith).collect::<Vec<_>>(),
        "aperture" => records.iter().map(|r| r.aperture.clone()).collect::<Vec<_>>(),
        "targnum" => records.iter().map(|r| r.targnum).collect::<Vec<_>>(),
        "propname" => records.iter().map(|r| r.propname.clone()).collect::<Vec<_>>(),
        "radeg" => records.iter().map(|r| r.radeg).collect::<Vec<_>>(),
        "decdeg" => records.iter().map(|r| r.decdeg).collect::<Vec<_>>(),
        "xbase" => records.iter().map(|r| r.xbase).collect::<Vec<_>>(),
        "ybase" => records.iter().map(|r| r.ybase).collect::<Vec<_>>(),
        "xdith" => records.iter().map(|r| r.xdith).collect::<Vec<_>>(),
        "ydith" => records.iter().map(|r| r.ydith).collect::<Vec<_>>(),
        "v2" => records.iter().map(|r| r.v2).collect::<Vec<_>>(),
        "v3" => records.iter().map(|r| r.v3).collect::<Vec<_>>(),
        "xidl" => records.iter().map(|r| r.xidl).collect::<Vec<_>>(),
        "yidl" => records.iter().map(|r| r.yidl).collect::<Vec<_>>(),
        "level" => records.iter().map(|r| r.level.clone()).collect::<Vec<_>>(),
        "type" => records.iter().map(|r| r.pointing_type.clone()).collect::<Vec<_>>(),
        "expar" => records.iter().map(|r| r.expar).collect::<Vec<_>>(),
        "dkpar" => records.iter().map(|r| r.dkpar).collect::<Vec<_>>(),
        "ddist" => records.iter().map(|r| r.ddist).collect::<Vec<_>>(),
    )
}
