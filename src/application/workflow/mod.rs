//! Story workflow - the directed graph that turns a theme into a story.
//!
//! Topology:
//!
//! ```text
//! planner ──needs_info──▶ end
//!    │
//!    ▼ fan-out
//! writer_1..writer_4 ──▶ [writer barrier] ──▶ finalize_text
//!                                                  │
//!                                                  ▼ fan-out
//!                   illustrator_1..illustrator_4 ──▶ [illustrator barrier] ──▶ finalize_images
//! ```
//!
//! Illustrators start only after text finalization, so the revised titles
//! and content can inform the imagery. The barriers are pure predicates
//! over accumulated state, re-evaluated after every branch completion.

mod finalizer;
mod graph;
mod illustrator;
mod planner;
mod writer;

pub use finalizer::{finalize_images, finalize_text, ordered_text_chapters};
pub use graph::{
    check_illustrators, check_writers, route_after_plan, BarrierDecision, PlanRoute, StoryGraph,
};
pub use illustrator::illustrate_chapter;
pub use planner::{plan, PlanOutcome};
pub use writer::write_chapter;

use crate::domain::story::{ChapterDraft, StoryState};

/// One branch's state delta: disjoint single-element (or empty) lists that
/// are concatenation-merged into the accumulators.
///
/// Each branch writes only its own chapter number, so the merge is
/// commutative and associative - branch completion order never affects the
/// merged state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchOutput {
    pub chapters: Vec<ChapterDraft>,
    pub completed_writers: Vec<u32>,
    pub completed_image_gens: Vec<u32>,
}

impl BranchOutput {
    /// A branch that contributed nothing and did not complete.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Concatenation-merges a branch output into the working state.
pub fn apply_branch(state: &mut StoryState, output: BranchOutput) {
    state.chapters.extend(output.chapters);
    state.completed_writers.extend(output.completed_writers);
    state
        .completed_image_gens
        .extend(output.completed_image_gens);
}
