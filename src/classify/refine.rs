//! Optional layout refinement of classifier output.
//!
//! A refiner looks at a rendered preview and may change element kinds.
//! It is never required: any failure, or any output that moves elements
//! around, collapses to [`Refinement::Unavailable`] and the heuristic
//! elements are used unchanged.

use super::TypedElement;
use crate::error::Result;
use crate::preview::PreviewImage;

/// A layout model that can confirm or override element kinds.
pub trait LayoutRefiner: Send + Sync {
    /// Refine `elements` using the page image. Implementations may change
    /// kinds but must return the same positions in the same order.
    fn refine(
        &self,
        preview: &PreviewImage,
        elements: &[TypedElement],
    ) -> Result<Vec<TypedElement>>;
}

/// Outcome of a refinement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// The refiner produced usable elements.
    Refined(Vec<TypedElement>),
    /// No preview, refiner failure, or rejected output.
    Unavailable,
}

impl Refinement {
    /// Whether refined elements are available.
    pub fn is_refined(&self) -> bool {
        matches!(self, Refinement::Refined(_))
    }

    /// Refined elements, or `heuristic` when unavailable.
    pub fn into_elements(self, heuristic: Vec<TypedElement>) -> Vec<TypedElement> {
        match self {
            Refinement::Refined(elements) => elements,
            Refinement::Unavailable => heuristic,
        }
    }
}

/// Run a refiner best-effort.
pub fn refine_elements(
    refiner: &dyn LayoutRefiner,
    preview: Option<&PreviewImage>,
    elements: &[TypedElement],
) -> Refinement {
    let Some(preview) = preview else {
        log::debug!("No preview available, skipping layout refinement");
        return Refinement::Unavailable;
    };

    match refiner.refine(preview, elements) {
        Ok(refined) => match validate(elements, &refined) {
            Ok(()) => {
                let changed = elements
                    .iter()
                    .zip(&refined)
                    .filter(|(a, b)| a.kind != b.kind)
                    .count();
                log::debug!("Layout refinement changed {} element kinds", changed);
                Refinement::Refined(refined)
            }
            Err(reason) => {
                log::warn!("Discarding layout refinement: {}", reason);
                Refinement::Unavailable
            }
        },
        Err(e) => {
            log::warn!("Layout refinement failed: {}", e);
            Refinement::Unavailable
        }
    }
}

fn validate(
    original: &[TypedElement],
    refined: &[TypedElement],
) -> std::result::Result<(), String> {
    if original.len() != refined.len() {
        return Err(format!(
            "expected {} elements, got {}",
            original.len(),
            refined.len()
        ));
    }
    for (i, (before, after)) in original.iter().zip(refined).enumerate() {
        if before.position != after.position {
            return Err(format!(
                "element {} moved from {:?} to {:?}",
                i, before.position, after.position
            ));
        }
        if !after.is_consistent() {
            return Err(format!(
                "element {} has kind {} at {:?}",
                i, after.kind, after.position
            ));
        }
    }
    Ok(())
}

/// Refiner that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRefiner;

impl LayoutRefiner for PassthroughRefiner {
    fn refine(
        &self,
        _preview: &PreviewImage,
        elements: &[TypedElement],
    ) -> Result<Vec<TypedElement>> {
        Ok(elements.to_vec())
    }
}
