use std::collections::HashSet;

use bbox_overlay_protocol::{Annotation, AnnotationId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate annotation id {0}")]
    DuplicateId(AnnotationId),
}

#[derive(Deserialize)]
struct BoundingBoxes {
    bounding_boxes: Vec<Annotation>,
}

/// The source answers either with the full response envelope
/// (`{"message", "data": {"bounding_boxes"}, "errors"}`) or with the bare
/// `data` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceResponse {
    Envelope { data: BoundingBoxes },
    Bare(BoundingBoxes),
}

/// Parse an annotation source response. Ids must be unique.
pub fn parse_annotations(data: &[u8]) -> Result<Vec<Annotation>, SourceError> {
    let boxes = match serde_json::from_slice::<SourceResponse>(data)? {
        SourceResponse::Envelope { data } | SourceResponse::Bare(data) => data.bounding_boxes,
    };
    let mut seen = HashSet::with_capacity(boxes.len());
    for annotation in &boxes {
        if !seen.insert(annotation.id.as_str()) {
            return Err(SourceError::DuplicateId(annotation.id.clone()));
        }
    }
    Ok(boxes)
}

/// A user's decision on one annotation, to be sent upstream by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub id: AnnotationId,
    pub accepted: bool,
}

/// The host's copy of the annotation set.
///
/// Deciding on an annotation drops it from the snapshot right away, before
/// the acknowledgement reaches the source.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    snapshot: Vec<Annotation>,
    seen: HashSet<AnnotationId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &[Annotation] {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Replace the snapshot. Returns ids never seen before in this store.
    pub fn replace(&mut self, snapshot: Vec<Annotation>) -> Vec<AnnotationId> {
        let fresh = snapshot
            .iter()
            .filter(|a| self.seen.insert(a.id.clone()))
            .map(|a| a.id.clone())
            .collect();
        self.snapshot = snapshot;
        fresh
    }

    /// Drop `id` from the snapshot. `None` if it is not in it.
    pub fn acknowledge(&mut self, id: &str, accepted: bool) -> Option<Acknowledgement> {
        let index = self.snapshot.iter().position(|a| a.id == id)?;
        let annotation = self.snapshot.remove(index);
        Some(Acknowledgement {
            id: annotation.id,
            accepted,
        })
    }

    /// Forget the snapshot and history, as when a new image is loaded.
    pub fn clear(&mut self) {
        self.snapshot.clear();
        self.seen.clear();
    }
}
