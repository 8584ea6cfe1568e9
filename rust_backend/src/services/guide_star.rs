//! Guide-star scheduling window extraction.
//!
//! Each visit of an observation carries a visit-planner result as a
//! `ToolValue` named `<tag>:<propid>:<obsid>:<visid>` whose text is itself an
//! XML document. Its `StVisitSchedulingWindows` container holds an
//! `UpToDate` flag and one `StConstraintSchedulingWindows` per constraint
//! type; the guide-star one carries the PCF stream in `StSchedulingPCF`.

use std::io::Write;
use std::str::FromStr;

use crate::config::{AptxConfig, GUIDE_STAR_CONSTRAINT};
use crate::core::domain::SchedulingWindow;
use crate::error::{AptxError, AptxResult};
use crate::models::xml::{NodeId, XmlDocument};
use crate::models::Observation;
use crate::parsing::pcf_parser::{decode_pcf, WindowAccumulator};
use crate::time::TimeFormat;

const VISIT_WINDOWS: &str = "StVisitSchedulingWindows";
const CONSTRAINT_WINDOWS: &str = "StConstraintSchedulingWindows";
const UP_TO_DATE: &str = "UpToDate";
const CONSTRAINT_TYPE: &str = "Type";
const SCHEDULING_PCF: &str = "StSchedulingPCF";

/// Parsed `ToolValue` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitKey {
    pub tag: String,
    pub proposal_id: String,
    pub observation: u32,
    pub visit: u32,
}

impl FromStr for VisitKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [tag, proposal_id, observation, visit] = parts.as_slice() else {
            return Err(format!(
                "visit planner name '{}' is not <tag>:<propid>:<obsid>:<visid>",
                s
            ));
        };

        let number = |raw: &str, what: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid {} '{}' in visit planner name '{}'", what, raw, s))
        };

        Ok(VisitKey {
            tag: tag.to_string(),
            proposal_id: proposal_id.to_string(),
            observation: number(*observation, "observation")?,
            visit: number(*visit, "visit")?,
        })
    }
}

/// One visit's planner payload, parsed.
#[derive(Debug, Clone)]
pub struct VisitPlannerResult {
    pub key: VisitKey,
    fragment: XmlDocument,
}

impl VisitPlannerResult {
    pub fn parse(name: &str, payload: &str) -> AptxResult<Self> {
        let key = name.parse::<VisitKey>().map_err(AptxError::Xml)?;
        let fragment = XmlDocument::parse(payload)?;
        Ok(Self { key, fragment })
    }

    fn elements_named<'d>(&'d self, local_name: &'d str) -> impl Iterator<Item = NodeId> + 'd {
        let doc = &self.fragment;
        std::iter::once(doc.root())
            .chain(doc.descendants(doc.root()))
            .filter(move |&id| doc.element(id).local_name == local_name)
    }

    /// The visit's `UpToDate` flag. Only an explicit `false` marks a stale
    /// result.
    pub fn is_up_to_date(&self) -> AptxResult<bool> {
        let container = self
            .elements_named(VISIT_WINDOWS)
            .next()
            .ok_or_else(|| AptxError::MissingElement(VISIT_WINDOWS.to_string()))?;
        Ok(self.fragment.attribute(container, UP_TO_DATE) != Some("false"))
    }

    /// PCF stream of the first constraint window block of `constraint_type`.
    pub fn pcf(&self, constraint_type: &str) -> AptxResult<&str> {
        let doc = &self.fragment;
        let block = self
            .elements_named(VISIT_WINDOWS)
            .flat_map(|container| doc.children(container).iter().copied())
            .find(|&child| {
                doc.element(child).local_name == CONSTRAINT_WINDOWS
                    && doc.attribute(child, CONSTRAINT_TYPE) == Some(constraint_type)
            })
            .ok_or_else(|| {
                AptxError::MissingElement(format!(
                    "{}[@{}='{}'] for visit {}:{}",
                    CONSTRAINT_WINDOWS,
                    CONSTRAINT_TYPE,
                    constraint_type,
                    self.key.observation,
                    self.key.visit
                ))
            })?;

        doc.attribute(block, SCHEDULING_PCF)
            .ok_or_else(|| AptxError::MissingElement(SCHEDULING_PCF.to_string()))
    }
}

/// Decodes guide-star windows for an observation.
#[derive(Debug, Clone)]
pub struct GuideStarWindowDecoder {
    time_format: TimeFormat,
    constraint_type: String,
}

impl GuideStarWindowDecoder {
    pub fn new(time_format: TimeFormat) -> Self {
        Self {
            time_format,
            constraint_type: GUIDE_STAR_CONSTRAINT.to_string(),
        }
    }

    pub fn from_config(config: &AptxConfig) -> Self {
        Self {
            time_format: config.guide_star.time_format,
            constraint_type: config.guide_star.constraint_type.clone(),
        }
    }

    /// Decode a different constraint block than `guide-star`.
    pub fn with_constraint_type(mut self, constraint_type: impl Into<String>) -> Self {
        self.constraint_type = constraint_type.into();
        self
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    /// Parse every visit-planner payload of `observation`.
    pub fn visit_planner_results(&self, observation: &Observation) -> AptxResult<Vec<VisitPlannerResult>> {
        let tool_values = observation.tool_values();
        if tool_values.is_empty() {
            return Err(AptxError::NoVisitPlannerData {
                observation: observation.number().unwrap_or_default().to_string(),
            });
        }

        tool_values
            .iter()
            .map(|tv| VisitPlannerResult::parse(tv.name, tv.payload))
            .collect()
    }

    /// Decode all visits of one observation into a single window list.
    ///
    /// Every visit is checked for staleness before any is decoded, so a
    /// stale visit yields an error and no windows.
    pub fn decode(
        &self,
        observation: &str,
        results: &[VisitPlannerResult],
    ) -> AptxResult<Vec<SchedulingWindow>> {
        for result in results {
            if !result.is_up_to_date()? {
                log::warn!(
                    "Visit {}:{} planner result is stale",
                    result.key.observation,
                    result.key.visit
                );
                return Err(AptxError::StaleVisitPlanner {
                    observation: observation.to_string(),
                });
            }
        }

        let mut windows = WindowAccumulator::new();
        for result in results {
            let pcf = result.pcf(&self.constraint_type)?;
            decode_pcf(
                pcf,
                result.key.observation,
                result.key.visit,
                self.time_format,
                &mut windows,
            )?;
        }

        log::info!(
            "Decoded {} {} windows from {} visits of observation {}",
            windows.len(),
            self.constraint_type,
            results.len(),
            observation
        );
        Ok(windows.into_windows())
    }

    pub fn decode_observation(&self, observation: &Observation) -> AptxResult<Vec<SchedulingWindow>> {
        let results = self.visit_planner_results(observation)?;
        self.decode(observation.number().unwrap_or_default(), &results)
    }

    /// Write one fixed-width line per window.
    pub fn write_windows<W: Write>(&self, windows: &[SchedulingWindow], out: &mut W) -> AptxResult<()> {
        for window in windows {
            let line = window.format_line(self.time_format).ok_or_else(|| AptxError::MalformedPcf {
                observation: window.observation.to_string(),
                visit: window.visit.to_string(),
                reason: format!("window time cannot be expressed as {}", self.time_format),
            })?;
            out.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    pub fn render(&self, windows: &[SchedulingWindow]) -> AptxResult<String> {
        let mut out = Vec::new();
        self.write_windows(windows, &mut out)?;
        String::from_utf8(out).map_err(|e| AptxError::Xml(e.to_string()))
    }
}

/// Output file name for an observation's windows: `<root>_<obs>.gswin`.
pub fn gswin_file_name(root: &str, observation: &str) -> String {
    format!("{}_{}.gswin", root, observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Proposal;
    use crate::test_fixtures::PROPOSAL_XML;
    use crate::time::EpochMillis;

    fn proposal() -> Proposal {
        Proposal::from_xml_str(PROPOSAL_XML).unwrap()
    }

    #[test]
    fn test_visit_key_parse() {
        let key: VisitKey = "VisitPlanner:1234:10:2".parse().unwrap();
        assert_eq!(key.tag, "VisitPlanner");
        assert_eq!(key.proposal_id, "1234");
        assert_eq!((key.observation, key.visit), (10, 2));

        assert!("VisitPlanner:1234:10".parse::<VisitKey>().is_err());
        assert!("VisitPlanner:1234:ten:2".parse::<VisitKey>().is_err());
    }

    #[test]
    fn test_decode_observation_across_visits() {
        let p = proposal();
        let obs = p.observation("10").unwrap();
        let windows = GuideStarWindowDecoder::new(TimeFormat::Unix)
            .decode_observation(&obs)
            .unwrap();

        assert_eq!(windows.len(), 2);

        assert_eq!((windows[0].observation, windows[0].visit), (10, 1));
        assert_eq!(windows[0].start.unix_seconds(), 1);
        assert_eq!(windows[0].end.unix_seconds(), 3);
        assert_eq!(windows[0].max_pa.value(), 10.0);

        assert_eq!(windows[1].visit, 2);
        assert_eq!(windows[1].start, EpochMillis::new(5000));
        assert_eq!(windows[1].end, EpochMillis::new(9000));
        assert_eq!(windows[1].probability, 0.5);
    }

    #[test]
    fn test_stale_visit_fails() {
        let p = proposal();
        let obs = p.observation("9").unwrap();
        match GuideStarWindowDecoder::new(TimeFormat::Unix).decode_observation(&obs) {
            Err(AptxError::StaleVisitPlanner { observation }) => assert_eq!(observation, "9"),
            other => panic!("Expected StaleVisitPlanner, got {:?}", other),
        }
    }

    #[test]
    fn test_observation_without_planner_data() {
        let p = proposal();
        let obs = p.observation("11").unwrap();
        assert!(matches!(
            GuideStarWindowDecoder::new(TimeFormat::Unix).decode_observation(&obs),
            Err(AptxError::NoVisitPlannerData { .. })
        ));
    }

    #[test]
    fn test_other_constraint_type() {
        let p = proposal();
        let obs = p.observation("10").unwrap();
        let decoder = GuideStarWindowDecoder::new(TimeFormat::Unix).with_constraint_type("sun");

        // Only visit 1 carries a sun block
        assert!(matches!(
            decoder.decode_observation(&obs),
            Err(AptxError::MissingElement(_))
        ));

        let results = decoder.visit_planner_results(&obs).unwrap();
        let windows = decoder.decode("10", &results[..1]).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end.unix_seconds(), 99);
    }

    #[test]
    fn test_render_isot() {
        let p = proposal();
        let obs = p.observation("10").unwrap();
        let decoder = GuideStarWindowDecoder::new(TimeFormat::Isot);
        let windows = decoder.decode_observation(&obs).unwrap();

        let text = decoder.render(&windows).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            " 10   1 1970-01-01T00:00:01 1970-01-01T00:00:03   0.000  10.000 1.000000"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_gswin_file_name() {
        assert_eq!(gswin_file_name("98765", "3"), "98765_3.gswin");
    }
}
