use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{AptxError, AptxResult};
use crate::models::entities::{Observation, ObservationMut, Target, TargetMut};
use crate::models::xml::{NodeId, XmlDocument};

pub(crate) const NUMBER: &str = "Number";
pub(crate) const TARGET: &str = "Target";
pub(crate) const OBSERVATION: &str = "Observation";
const SCHEMA_VERSION: &str = "schemaVersion";

/// Result of [`Proposal::update_target`] and [`Proposal::update_observation`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The entity with the replacement's number was swapped out
    Replaced,
    /// No entity carries the replacement's number; the tree is untouched
    NotFound,
}

#[derive(Debug, Clone, Copy)]
enum EntityKind {
    Target,
    Observation,
}

impl EntityKind {
    fn element(self) -> &'static str {
        match self {
            EntityKind::Target => TARGET,
            EntityKind::Observation => OBSERVATION,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EntityKind::Target => "target",
            EntityKind::Observation => "observation",
        }
    }
}

/// A proposal document and the archive it came from.
///
/// The document's default namespace is used for every entity lookup, so
/// callers never handle the namespace URI. Targets and observations are
/// indexed by their `Number` text; the index is rebuilt after every edit.
#[derive(Debug, Clone)]
pub struct Proposal {
    document: XmlDocument,
    namespace: Option<String>,
    schema_version: Option<String>,
    xml_entry: Option<String>,
    archive: BTreeMap<String, Vec<u8>>,
    targets: BTreeMap<String, NodeId>,
    observations: BTreeMap<String, NodeId>,
}

impl Proposal {
    /// Build a proposal from bare XML text (no archive).
    pub fn from_xml_str(xml: &str) -> AptxResult<Self> {
        let document = XmlDocument::parse(xml)?;
        let root = document.element(document.root());

        let mut proposal = Self {
            namespace: root.namespace.clone(),
            schema_version: root.attribute(SCHEMA_VERSION).map(str::to_string),
            document,
            xml_entry: None,
            archive: BTreeMap::new(),
            targets: BTreeMap::new(),
            observations: BTreeMap::new(),
        };
        proposal.reindex();
        Ok(proposal)
    }

    /// Build a proposal from the bytes of a `.aptx` zip archive.
    ///
    /// `archive_name` is the archive's file name; the document is the entry
    /// named after its stem with an `.xml` extension. All entries are kept.
    pub fn from_archive_bytes(archive_name: &str, bytes: &[u8]) -> AptxResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = BTreeMap::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            entries.insert(file.name().to_string(), content);
        }

        let xml_entry = xml_entry_name(archive_name)?;
        let xml_bytes = entries.get(&xml_entry).ok_or_else(|| {
            AptxError::Archive(format!(
                "{} has no entry '{}' (entries: {})",
                archive_name,
                xml_entry,
                entries.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        let xml = std::str::from_utf8(xml_bytes)
            .map_err(|e| AptxError::Xml(format!("{} is not UTF-8: {}", xml_entry, e)))?;

        let mut proposal = Self::from_xml_str(xml)?;
        log::debug!(
            "Loaded {} with {} archive entries, {} targets, {} observations",
            archive_name,
            entries.len(),
            proposal.targets.len(),
            proposal.observations.len()
        );
        proposal.xml_entry = Some(xml_entry);
        proposal.archive = entries;
        Ok(proposal)
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.document
    }

    /// URI of the document's default namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    /// Archive entry holding the document, when loaded from an archive.
    pub fn xml_entry(&self) -> Option<&str> {
        self.xml_entry.as_deref()
    }

    /// Every archive entry by name, passed through untouched.
    pub fn archive_entries(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.archive
    }

    /// First descendant of `node` named `local_name` in the proposal namespace.
    pub(crate) fn find(&self, node: NodeId, local_name: &str) -> Option<NodeId> {
        self.document.find_descendant(node, self.namespace(), local_name)
    }

    /// Look up a target by number. An absent target is not an error.
    pub fn target(&self, number: &str) -> Option<Target<'_>> {
        self.targets
            .get(number.trim())
            .map(|&node| Target::new(self, node))
    }

    /// Look up an observation by number.
    pub fn observation(&self, number: &str) -> AptxResult<Observation<'_>> {
        self.observations
            .get(number.trim())
            .map(|&node| Observation::new(self, node))
            .ok_or_else(|| AptxError::NoSuchEntity {
                kind: EntityKind::Observation.label(),
                number: number.to_string(),
            })
    }

    pub fn target_mut(&mut self, number: &str) -> Option<TargetMut<'_>> {
        let node = *self.targets.get(number.trim())?;
        Some(TargetMut::new(self, node))
    }

    pub fn observation_mut(&mut self, number: &str) -> AptxResult<ObservationMut<'_>> {
        match self.observations.get(number.trim()) {
            Some(&node) => Ok(ObservationMut::new(self, node)),
            None => Err(AptxError::NoSuchEntity {
                kind: EntityKind::Observation.label(),
                number: number.to_string(),
            }),
        }
    }

    /// Distinct target numbers, sorted as strings.
    pub fn target_numbers(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    /// Distinct observation numbers, sorted as strings.
    pub fn observation_numbers(&self) -> Vec<String> {
        self.observations.keys().cloned().collect()
    }

    /// Replace the target whose number matches `replacement`'s `Number`.
    ///
    /// `replacement` is usually a [`Target::detach`] copy that was edited.
    pub fn update_target(&mut self, replacement: &XmlDocument) -> AptxResult<UpdateOutcome> {
        self.replace_entity(EntityKind::Target, replacement)
    }

    /// Replace the observation whose number matches `replacement`'s `Number`.
    pub fn update_observation(&mut self, replacement: &XmlDocument) -> AptxResult<UpdateOutcome> {
        self.replace_entity(EntityKind::Observation, replacement)
    }

    fn replace_entity(
        &mut self,
        kind: EntityKind,
        replacement: &XmlDocument,
    ) -> AptxResult<UpdateOutcome> {
        let replacement_root = replacement.root();
        let root_name = &replacement.element(replacement_root).local_name;
        if root_name != kind.element() {
            return Err(AptxError::Xml(format!(
                "replacement for a {} is a <{}> element",
                kind.label(),
                root_name
            )));
        }

        let number = replacement
            .children(replacement_root)
            .iter()
            .find(|&&c| replacement.element(c).local_name == NUMBER)
            .map(|&c| replacement.text(c).to_string())
            .ok_or_else(|| {
                AptxError::MissingElement(format!("replacement {} has no Number", kind.label()))
            })?;

        let index = match kind {
            EntityKind::Target => &self.targets,
            EntityKind::Observation => &self.observations,
        };
        let Some(&old) = index.get(&number) else {
            log::warn!("Proposal has no {} {}; nothing replaced", kind.label(), number);
            return Ok(UpdateOutcome::NotFound);
        };

        self.document.replace_with(old, replacement, replacement_root);
        self.reindex();

        log::info!("Replaced {} {}", kind.label(), number);
        log::debug!("Proposal arena holds {} slots", self.document.capacity());
        Ok(UpdateOutcome::Replaced)
    }

    /// Rebuild the number indices from the live tree.
    ///
    /// When several entities share a number the first in document order wins.
    pub(crate) fn reindex(&mut self) {
        self.targets = self.index(EntityKind::Target);
        self.observations = self.index(EntityKind::Observation);
    }

    fn index(&self, kind: EntityKind) -> BTreeMap<String, NodeId> {
        let root = self.document.root();
        let ns = self.namespace();

        let mut index = BTreeMap::new();
        for node in std::iter::once(root).chain(self.document.descendants(root)) {
            if self.document.element(node).local_name != kind.element()
                || self.document.element(node).namespace.as_deref() != ns
            {
                continue;
            }
            if let Some(number) = self.document.find_child(node, ns, NUMBER) {
                index
                    .entry(self.document.text(number).to_string())
                    .or_insert(node);
            }
        }
        index
    }
}

/// `dir/12345.aptx` -> `12345.xml`
fn xml_entry_name(archive_name: &str) -> AptxResult<String> {
    Path::new(archive_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| format!("{}.xml", stem))
        .ok_or_else(|| AptxError::Archive(format!("cannot derive entry name from '{}'", archive_name)))
}
