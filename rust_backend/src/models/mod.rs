//! Proposal document model.
//!
//! A [`Proposal`] owns its parsed [`XmlDocument`] and hands out views
//! ([`Target`], [`Observation`], [`Template`], [`MosaicParameters`]) that
//! borrow it. Edits go through [`TargetMut`] / [`ObservationMut`] or whole
//! subtree replacement with [`Proposal::update_target`] and
//! [`Proposal::update_observation`].

pub mod coordinates;
pub mod entities;
pub mod proposal;
pub mod xml;


pub use coordinates::EquatorialCoordinates;
pub use entities::{
    MosaicParameters, Observation, ObservationMut, Target, TargetMut, Template, ToolValue,
};
pub use proposal::{Proposal, UpdateOutcome};
pub use xml::{NodeId, XmlDocument, XmlElement};
