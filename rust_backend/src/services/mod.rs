//! Service layer over the proposal model.
//!
//! Services combine model lookups with the parsers: decoding guide-star
//! windows for an observation and building printable summaries.

pub mod guide_star;
pub mod summary;

pub use guide_star::{gswin_file_name, GuideStarWindowDecoder, VisitKey, VisitPlannerResult};
pub use summary::{
    format_schema_groups, group_by_schema_version, root_name, target_summaries,
    ObservationSummary, ProposalSummary, TargetSummary,
};
