//! Views over the entities of a [`Proposal`].
//!
//! Read-only views borrow the proposal and address their element by
//! [`NodeId`]; nothing is copied until [`Target::detach`] or
//! [`Observation::detach`] is called. The `*Mut` views hold the proposal
//! mutably, so edits made through them are seen by every later lookup.

use qtty::Degrees;

use crate::error::{AptxError, AptxResult};
use crate::models::coordinates::EquatorialCoordinates;
use crate::models::proposal::{Proposal, UpdateOutcome, NUMBER};
use crate::models::xml::{NodeId, XmlDocument};

const TARGET_NAME: &str = "TargetName";
const TARGET_ID: &str = "TargetID";
const EQUATORIAL_COORDINATES: &str = "EquatorialCoordinates";
const COORDINATES_VALUE: &str = "Value";
const RA_PROPER_MOTION: &str = "RAProperMotion";
const RA_PROPER_MOTION_UNITS: &str = "RAProperMotionUnits";
const DEC_PROPER_MOTION: &str = "DecProperMotion";
const DEC_PROPER_MOTION_UNITS: &str = "DecProperMotionUnits";
const INSTRUMENT: &str = "Instrument";
const TEMPLATE: &str = "Template";
const MOSAIC_PARAMETERS: &str = "MosaicParameters";
const TOOL_VALUE: &str = "ToolValue";
const TOOL_VALUE_NAME: &str = "Name";

/// Text of the first `local_name` descendant of `node`.
fn field_text<'a>(proposal: &'a Proposal, node: NodeId, local_name: &str) -> Option<&'a str> {
    proposal
        .find(node, local_name)
        .map(|id| proposal.document().text(id))
}

/// Overwrite the text of the first `local_name` descendant of `node`.
fn set_field_text(
    proposal: &mut Proposal,
    node: NodeId,
    local_name: &str,
    value: &str,
) -> AptxResult<()> {
    let id = proposal
        .find(node, local_name)
        .ok_or_else(|| AptxError::MissingElement(local_name.to_string()))?;
    proposal.document_mut().set_text(id, value);
    Ok(())
}

/// A target in a proposal.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    proposal: &'a Proposal,
    node: NodeId,
}

impl<'a> Target<'a> {
    pub(crate) fn new(proposal: &'a Proposal, node: NodeId) -> Self {
        Self { proposal, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn number(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, NUMBER)
    }

    /// Name used in the proposal.
    pub fn proposal_name(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, TARGET_NAME)
    }

    /// Name used by the archive.
    pub fn archive_name(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, TARGET_ID)
    }

    /// Parsed equatorial coordinates, `None` for targets without them
    /// (moving or generic targets).
    pub fn coordinates(&self) -> AptxResult<Option<EquatorialCoordinates>> {
        let Some(id) = self.proposal.find(self.node, EQUATORIAL_COORDINATES) else {
            return Ok(None);
        };
        match self.proposal.document().attribute(id, COORDINATES_VALUE) {
            Some(value) => EquatorialCoordinates::parse(value).map(Some),
            None => Ok(None),
        }
    }

    pub fn ra_proper_motion(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, RA_PROPER_MOTION)
    }

    pub fn ra_proper_motion_units(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, RA_PROPER_MOTION_UNITS)
    }

    pub fn dec_proper_motion(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, DEC_PROPER_MOTION)
    }

    pub fn dec_proper_motion_units(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, DEC_PROPER_MOTION_UNITS)
    }

    /// Owned copy of the target subtree, e.g. to edit and pass back to
    /// [`Proposal::update_target`].
    pub fn detach(&self) -> XmlDocument {
        self.proposal.document().extract(self.node)
    }
}

/// The template of an observation.
///
/// Identity comes from the first child of the `Template` container: its
/// namespace prefix is the template id and its local name the template name.
#[derive(Debug, Clone, Copy)]
pub struct Template<'a> {
    proposal: &'a Proposal,
    container: NodeId,
    element: Option<NodeId>,
}

impl<'a> Template<'a> {
    pub fn node(&self) -> NodeId {
        self.container
    }

    /// Namespace prefix of the template element, e.g. `nci`.
    pub fn template_id(&self) -> Option<&'a str> {
        let element = self.proposal.document().element(self.element?);
        element.prefix.as_deref()
    }

    /// Local name of the template element, `None` when the element is not
    /// namespace-qualified.
    pub fn name(&self) -> Option<&'a str> {
        let element = self.proposal.document().element(self.element?);
        element
            .namespace
            .as_ref()
            .map(|_| element.local_name.as_str())
    }

    pub fn detach(&self) -> XmlDocument {
        self.proposal.document().extract(self.container)
    }
}

/// Mosaic tiling of an observation. Values are the raw element text.
#[derive(Debug, Clone, Copy)]
pub struct MosaicParameters<'a> {
    proposal: &'a Proposal,
    node: NodeId,
}

impl<'a> MosaicParameters<'a> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn rows(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "Rows")
    }

    pub fn columns(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "Columns")
    }

    pub fn row_overlap_percent(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "RowOverlapPercent")
    }

    pub fn column_overlap_percent(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "ColumnOverlapPercent")
    }

    pub fn skew_x(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "SkewDegreesX")
    }

    pub fn skew_y(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, "SkewDegreesY")
    }

    pub fn detach(&self) -> XmlDocument {
        self.proposal.document().extract(self.node)
    }
}

/// A named tool payload attached to an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolValue<'a> {
    pub name: &'a str,
    pub payload: &'a str,
}

/// An observation in a proposal.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    proposal: &'a Proposal,
    node: NodeId,
}

impl<'a> Observation<'a> {
    pub(crate) fn new(proposal: &'a Proposal, node: NodeId) -> Self {
        Self { proposal, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn number(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, NUMBER)
    }

    /// Target reference text, e.g. `1 NGC-1234`.
    pub fn target_id(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, TARGET_ID)
    }

    pub fn instrument(&self) -> Option<&'a str> {
        field_text(self.proposal, self.node, INSTRUMENT)
    }

    /// The observation's template; `None` when it has no `Template` element.
    pub fn template(&self) -> Option<Template<'a>> {
        let container = self.proposal.find(self.node, TEMPLATE)?;
        let element = self.proposal.document().children(container).first().copied();
        Some(Template {
            proposal: self.proposal,
            container,
            element,
        })
    }

    /// Mosaic parameters; most observations have none.
    pub fn mosaic(&self) -> Option<MosaicParameters<'a>> {
        self.proposal
            .find(self.node, MOSAIC_PARAMETERS)
            .map(|node| MosaicParameters {
                proposal: self.proposal,
                node,
            })
    }

    /// Named `ToolValue` payloads in document order. Unnamed ones are skipped.
    pub fn tool_values(&self) -> Vec<ToolValue<'a>> {
        let doc = self.proposal.document();
        doc.find_descendants(self.node, self.proposal.namespace(), TOOL_VALUE)
            .into_iter()
            .filter_map(|id| {
                let name = doc.attribute(id, TOOL_VALUE_NAME);
                if name.is_none() {
                    log::debug!("Skipping unnamed ToolValue in observation {:?}", self.number());
                }
                name.map(|name| ToolValue {
                    name,
                    payload: doc.text(id),
                })
            })
            .collect()
    }

    /// Owned copy of the observation subtree.
    pub fn detach(&self) -> XmlDocument {
        self.proposal.document().extract(self.node)
    }
}

/// Editable target. Setting the number re-indexes the proposal.
#[derive(Debug)]
pub struct TargetMut<'a> {
    proposal: &'a mut Proposal,
    node: NodeId,
}

impl<'a> TargetMut<'a> {
    pub(crate) fn new(proposal: &'a mut Proposal, node: NodeId) -> Self {
        Self { proposal, node }
    }

    pub fn view(&self) -> Target<'_> {
        Target::new(&*self.proposal, self.node)
    }

    pub fn set_number(&mut self, number: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, NUMBER, number)?;
        self.proposal.reindex();
        Ok(())
    }

    pub fn set_proposal_name(&mut self, name: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, TARGET_NAME, name)
    }

    pub fn set_archive_name(&mut self, name: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, TARGET_ID, name)
    }

    /// Rewrite the coordinates `Value` attribute in sexagesimal form.
    pub fn set_coordinates(&mut self, ra: Degrees, dec: Degrees) -> AptxResult<()> {
        let id = self
            .proposal
            .find(self.node, EQUATORIAL_COORDINATES)
            .ok_or_else(|| AptxError::MissingElement(EQUATORIAL_COORDINATES.to_string()))?;
        let value = EquatorialCoordinates::from_degrees(ra, dec).to_string();
        self.proposal
            .document_mut()
            .set_attribute(id, COORDINATES_VALUE, value);
        Ok(())
    }

    pub fn set_proper_motion(&mut self, ra: &str, dec: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, RA_PROPER_MOTION, ra)?;
        set_field_text(self.proposal, self.node, DEC_PROPER_MOTION, dec)
    }

    pub fn set_proper_motion_units(&mut self, ra_units: &str, dec_units: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, RA_PROPER_MOTION_UNITS, ra_units)?;
        set_field_text(self.proposal, self.node, DEC_PROPER_MOTION_UNITS, dec_units)
    }
}

/// Editable observation. Setting the number re-indexes the proposal.
#[derive(Debug)]
pub struct ObservationMut<'a> {
    proposal: &'a mut Proposal,
    node: NodeId,
}

impl<'a> ObservationMut<'a> {
    pub(crate) fn new(proposal: &'a mut Proposal, node: NodeId) -> Self {
        Self { proposal, node }
    }

    pub fn view(&self) -> Observation<'_> {
        Observation::new(&*self.proposal, self.node)
    }

    pub fn set_number(&mut self, number: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, NUMBER, number)?;
        self.proposal.reindex();
        Ok(())
    }

    pub fn set_target_id(&mut self, target_id: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, TARGET_ID, target_id)
    }

    pub fn set_instrument(&mut self, instrument: &str) -> AptxResult<()> {
        set_field_text(self.proposal, self.node, INSTRUMENT, instrument)
    }

    /// Swap the observation's mosaic subtree for `mosaic`.
    pub fn replace_mosaic(&mut self, mosaic: &XmlDocument) -> UpdateOutcome {
        let Some(old) = self.proposal.find(self.node, MOSAIC_PARAMETERS) else {
            log::warn!("Observation has no MosaicParameters to replace");
            return UpdateOutcome::NotFound;
        };
        self.proposal
            .document_mut()
            .replace_with(old, mosaic, mosaic.root());
        UpdateOutcome::Replaced
    }
}
