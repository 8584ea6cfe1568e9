//! Human-readable proposal summaries and schema-version grouping.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::AptxResult;
use crate::models::{MosaicParameters, Observation, Proposal, Target};

/// Wrap width for schema-version listings.
pub const SCHEMA_LINE_WIDTH: usize = 78;

const UNKNOWN_VERSION: &str = "unknown";

/// Render an optional field the way the summaries show absent values.
fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub number: Option<String>,
    pub proposal_name: Option<String>,
    pub archive_name: Option<String>,
    pub ra_text: Option<String>,
    pub ra_deg: Option<f64>,
    pub dec_text: Option<String>,
    pub dec_deg: Option<f64>,
    pub pm_ra: Option<String>,
    pub pm_ra_units: Option<String>,
    pub pm_dec: Option<String>,
    pub pm_dec_units: Option<String>,
}

impl TargetSummary {
    pub fn from_target(target: &Target) -> AptxResult<Self> {
        let coordinates = target.coordinates()?;
        Ok(Self {
            number: owned(target.number()),
            proposal_name: owned(target.proposal_name()),
            archive_name: owned(target.archive_name()),
            ra_text: coordinates.as_ref().map(|c| c.ra_text.clone()),
            ra_deg: coordinates.as_ref().map(|c| c.ra.value()),
            dec_text: coordinates.as_ref().map(|c| c.dec_text.clone()),
            dec_deg: coordinates.as_ref().map(|c| c.dec.value()),
            pm_ra: owned(target.ra_proper_motion()),
            pm_ra_units: owned(target.ra_proper_motion_units()),
            pm_dec: owned(target.dec_proper_motion()),
            pm_dec_units: owned(target.dec_proper_motion_units()),
        })
    }
}

impl fmt::Display for TargetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Number='{}', Proposal Name='{}', Archive Name='{}'",
            shown(&self.number),
            shown(&self.proposal_name),
            shown(&self.archive_name)
        )?;
        if let (Some(ra), Some(dec)) = (self.ra_deg, self.dec_deg) {
            writeln!(
                f,
                "RA='{}' ({} deg), Dec='{}' ({} deg)",
                shown(&self.ra_text),
                ra,
                shown(&self.dec_text),
                dec
            )?;
        }
        write!(
            f,
            "pmRA={} {}, pmDec={} {}",
            shown(&self.pm_ra),
            self.pm_ra_units.as_deref().unwrap_or(""),
            shown(&self.pm_dec),
            self.pm_dec_units.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MosaicSummary {
    pub rows: Option<String>,
    pub columns: Option<String>,
    pub row_overlap_percent: Option<String>,
    pub column_overlap_percent: Option<String>,
    pub skew_x: Option<String>,
    pub skew_y: Option<String>,
}

impl From<&MosaicParameters<'_>> for MosaicSummary {
    fn from(mosaic: &MosaicParameters<'_>) -> Self {
        Self {
            rows: owned(mosaic.rows()),
            columns: owned(mosaic.columns()),
            row_overlap_percent: owned(mosaic.row_overlap_percent()),
            column_overlap_percent: owned(mosaic.column_overlap_percent()),
            skew_x: owned(mosaic.skew_x()),
            skew_y: owned(mosaic.skew_y()),
        }
    }
}

impl fmt::Display for MosaicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Mosaic Rows={}, Overlap={}%, Xskew={} degrees",
            shown(&self.rows),
            shown(&self.row_overlap_percent),
            shown(&self.skew_x)
        )?;
        write!(
            f,
            "         Cols={}, Overlap={}%, Yskew={} degrees",
            shown(&self.columns),
            shown(&self.column_overlap_percent),
            shown(&self.skew_y)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSummary {
    pub number: Option<String>,
    pub instrument: Option<String>,
    pub target_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub mosaic: Option<MosaicSummary>,
}

impl From<&Observation<'_>> for ObservationSummary {
    fn from(observation: &Observation<'_>) -> Self {
        let template = observation.template();
        Self {
            number: owned(observation.number()),
            instrument: owned(observation.instrument()),
            target_id: owned(observation.target_id()),
            template_id: owned(template.and_then(|t| t.template_id())),
            template_name: owned(template.and_then(|t| t.name())),
            mosaic: observation.mosaic().as_ref().map(MosaicSummary::from),
        }
    }
}

impl fmt::Display for ObservationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Observation Number='{}', Instrument='{}'",
            shown(&self.number),
            shown(&self.instrument)
        )?;
        writeln!(f, "  TargetID='{}'", shown(&self.target_id))?;
        write!(
            f,
            "  Template ID='{}', Name='{}'",
            shown(&self.template_id),
            shown(&self.template_name)
        )?;
        if let Some(mosaic) = &self.mosaic {
            write!(f, "\n{}", mosaic)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalSummary {
    pub file: String,
    pub schema_version: Option<String>,
    pub observations: Vec<ObservationSummary>,
}

impl ProposalSummary {
    /// Summarize every observation, in observation-number order.
    pub fn from_proposal(file: &str, proposal: &Proposal) -> AptxResult<Self> {
        let observations = proposal
            .observation_numbers()
            .iter()
            .map(|n| proposal.observation(n).map(|o| ObservationSummary::from(&o)))
            .collect::<AptxResult<Vec<_>>>()?;

        Ok(Self {
            file: file.to_string(),
            schema_version: owned(proposal.schema_version()),
            observations,
        })
    }
}

impl fmt::Display for ProposalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File='{}', schemaVersion='{}'",
            self.file,
            shown(&self.schema_version)
        )?;
        for observation in &self.observations {
            write!(f, "\n{}", observation)?;
        }
        Ok(())
    }
}

/// Summaries of every target, in target-number order.
pub fn target_summaries(proposal: &Proposal) -> AptxResult<Vec<TargetSummary>> {
    proposal
        .target_numbers()
        .iter()
        .filter_map(|n| proposal.target(n))
        .map(|t| TargetSummary::from_target(&t))
        .collect()
}

/// File name without directory and extension: `dir/12345.aptx` -> `12345`.
pub fn root_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Group proposal roots by schema version.
///
/// Versions are sorted; roots keep their input order. A proposal without a
/// version is listed under `unknown`.
pub fn group_by_schema_version<I>(entries: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (root, version) in entries {
        let version = version.unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        let roots = groups.entry(version).or_default();
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    groups
}

/// `schemaVersion=<v>: <roots…>` lines, wrapped at [`SCHEMA_LINE_WIDTH`].
pub fn format_schema_groups(groups: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    groups
        .iter()
        .flat_map(|(version, roots)| {
            let line = format!("schemaVersion={}: {}", version, roots.join(" "));
            wrap(&line, SCHEMA_LINE_WIDTH)
        })
        .collect()
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::PROPOSAL_XML;

    #[test]
    fn test_proposal_summary_text() {
        let proposal = Proposal::from_xml_str(PROPOSAL_XML).unwrap();
        let summary = ProposalSummary::from_proposal("1234.aptx", &proposal).unwrap();

        assert_eq!(summary.observations.len(), 3);
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "File='1234.aptx', schemaVersion='2024.1'");
        assert_eq!(lines[1], "Observation Number='10', Instrument='NIRCAM'");
        assert_eq!(lines[2], "  TargetID='1 NGC-1234'");
        assert_eq!(lines[3], "  Template ID='nci', Name='NircamImaging'");
        assert_eq!(lines[4], "  Mosaic Rows=2, Overlap=10.0%, Xskew=0.0 degrees");
        assert!(text.contains("  Template ID='None', Name='None'"));
    }

    #[test]
    fn test_target_summary() {
        let proposal = Proposal::from_xml_str(PROPOSAL_XML).unwrap();
        let targets = target_summaries(&proposal).unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].proposal_name.as_deref(), Some("M31"));
        assert_eq!(targets[1].dec_text.as_deref(), Some("+41 16 07.50"));

        let text = targets[1].to_string();
        assert!(text.starts_with("Number='2', Proposal Name='M31', Archive Name='2 M31'\n"));
        assert!(text.ends_with("pmRA=0.0 mas/yr, pmDec=0.0 mas/yr"));
    }

    #[test]
    fn test_root_name() {
        assert_eq!(root_name("/data/12345.aptx"), "12345");
        assert_eq!(root_name("paxt.aptx"), "paxt");
    }

    #[test]
    fn test_group_by_schema_version() {
        let groups = group_by_schema_version(vec![
            ("300".to_string(), Some("2024.1".to_string())),
            ("100".to_string(), Some("2023.4".to_string())),
            ("200".to_string(), Some("2024.1".to_string())),
            ("400".to_string(), None),
        ]);

        let versions: Vec<&String> = groups.keys().collect();
        assert_eq!(versions, vec!["2023.4", "2024.1", "unknown"]);
        assert_eq!(groups["2024.1"], vec!["300", "200"]);

        let lines = format_schema_groups(&groups);
        assert_eq!(lines[0], "schemaVersion=2023.4: 100");
        assert_eq!(lines[1], "schemaVersion=2024.1: 300 200");
    }

    #[test]
    fn test_schema_lines_wrap() {
        let roots: Vec<String> = (10000..10020).map(|n| n.to_string()).collect();
        let groups = group_by_schema_version(roots.into_iter().map(|r| (r, Some("5.1".to_string()))));

        let lines = format_schema_groups(&groups);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= SCHEMA_LINE_WIDTH));
        assert!(lines[0].starts_with("schemaVersion=5.1: 10000 10001"));
    }
}
