//! Graph driver - conditional edges, barrier predicates, and the run loop.
//!
//! The barriers are pure predicates over accumulated state, re-evaluated
//! after every branch completion rather than implemented as blocking joins.
//! Re-evaluation is idempotent: duplicate completion entries are collapsed
//! to a set, and a satisfied barrier whose finalization already ran decides
//! `Wait`, so finalizers can never double-trigger.
//!
//! The driver never blocks on an unmet barrier. Parallel branches are
//! drained as they complete; if the drain finishes with a barrier still
//! unmet (an illustrator withheld completion, say), the run simply ends
//! with that finalization absent.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::domain::story::{StoryState, CHAPTER_COUNT};
use crate::ports::{ImageGenerator, ProgressEvent, ProgressPublisher, TextGenerator, WorkflowStage};

use super::{
    apply_branch, finalize_images, finalize_text, illustrate_chapter, plan, write_chapter,
    PlanOutcome,
};

/// Where to go after the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRoute {
    /// Fan out to the chapter branches.
    Fanout,
    /// Terminate the run; the user must supply more information.
    End,
}

/// Conditional edge out of the planner node.
pub fn route_after_plan(state: &StoryState) -> PlanRoute {
    if state.needs_info {
        PlanRoute::End
    } else {
        PlanRoute::Fanout
    }
}

/// A barrier's verdict for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierDecision {
    /// The gated node may run now.
    Proceed,
    /// Predicate unmet (or the gated node already ran); check again on the
    /// next completion event.
    Wait,
}

/// Writer completion barrier: all four writers done and text not yet
/// finalized.
pub fn check_writers(state: &StoryState) -> BarrierDecision {
    if state.unique_completed_writers() == CHAPTER_COUNT && state.finalized_text.is_none() {
        BarrierDecision::Proceed
    } else {
        BarrierDecision::Wait
    }
}

/// Illustrator completion barrier: text already finalized, all four
/// illustrators done, and images not yet finalized.
pub fn check_illustrators(state: &StoryState) -> BarrierDecision {
    if state.finalized_text.is_some()
        && state.unique_completed_image_gens() == CHAPTER_COUNT
        && state.finalized_images.is_none()
    {
        BarrierDecision::Proceed
    } else {
        BarrierDecision::Wait
    }
}

/// The story workflow graph.
///
/// Owns the capability ports and drives one run over a working
/// [`StoryState`]. Node-local failures are absorbed inside the nodes; a run
/// never returns an error, only a state reflecting how far it got.
pub struct StoryGraph {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    publisher: Arc<dyn ProgressPublisher>,
}

impl StoryGraph {
    /// Creates a graph over the given capabilities.
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        publisher: Arc<dyn ProgressPublisher>,
    ) -> Self {
        Self {
            text,
            image,
            publisher,
        }
    }

    /// Runs the workflow to completion (or early termination) and returns
    /// the final working state.
    pub async fn run(&self, mut state: StoryState) -> StoryState {
        let session_id = state.session_id.clone();

        self.emit(&state, ProgressEvent::StageStarted {
            stage: WorkflowStage::Planner,
        })
        .await;

        match plan(self.text.as_ref(), &state).await {
            PlanOutcome::NeedsInfo {
                language,
                missing_fields,
                suggestions,
            } => {
                state.language = language;
                state.needs_info = true;
                state.missing_fields = missing_fields;
                state.suggestions = suggestions;
                state.story_outline = None;
            }
            PlanOutcome::Outline { language, outline } => {
                state.language = language;
                state.needs_info = false;
                state.missing_fields.clear();
                state.suggestions.clear();
                state.story_outline = Some(outline);
            }
        }

        self.emit(&state, ProgressEvent::StageCompleted {
            stage: WorkflowStage::Planner,
        })
        .await;

        if route_after_plan(&state) == PlanRoute::End {
            tracing::info!(session_id = %session_id, "planner needs more information, run ends");
            return state;
        }

        let Some(outline) = state.story_outline.clone() else {
            // Unreachable after a Fanout route; bail rather than panic.
            return state;
        };
        let outline = Arc::new(outline);

        // Writer fan-out: four independent branches, merged as they land.
        let mut writers = FuturesUnordered::new();
        for number in 1..=CHAPTER_COUNT as u32 {
            self.emit(&state, ProgressEvent::StageStarted {
                stage: WorkflowStage::Writer(number),
            })
            .await;

            let text = Arc::clone(&self.text);
            let outline = Arc::clone(&outline);
            let language = state.language.clone();
            writers.push(async move {
                let output = write_chapter(text.as_ref(), &outline, &language, number).await;
                (WorkflowStage::Writer(number), output)
            });
        }

        while let Some((stage, output)) = writers.next().await {
            apply_branch(&mut state, output);
            self.emit(&state, ProgressEvent::StageCompleted { stage }).await;

            if check_writers(&state) == BarrierDecision::Proceed {
                self.run_finalize_text(&mut state).await;
            }
        }

        if state.finalized_text.is_none() {
            tracing::warn!(
                session_id = %session_id,
                completed = state.unique_completed_writers(),
                "writer barrier never satisfied, run ends without finalized text"
            );
            return state;
        }

        // Illustrator fan-out, released by text finalization so the revised
        // chapters can inform the imagery.
        let mut illustrators = FuturesUnordered::new();
        for number in 1..=CHAPTER_COUNT as u32 {
            self.emit(&state, ProgressEvent::StageStarted {
                stage: WorkflowStage::Illustrator(number),
            })
            .await;

            let image = Arc::clone(&self.image);
            let outline = Arc::clone(&outline);
            illustrators.push(async move {
                let output = illustrate_chapter(image.as_ref(), &outline, number).await;
                (WorkflowStage::Illustrator(number), output)
            });
        }

        while let Some((stage, output)) = illustrators.next().await {
            let completed = !output.completed_image_gens.is_empty();
            apply_branch(&mut state, output);
            if completed {
                self.emit(&state, ProgressEvent::StageCompleted { stage }).await;
            }

            if check_illustrators(&state) == BarrierDecision::Proceed {
                self.run_finalize_images(&mut state).await;
            }
        }

        if state.finalized_images.is_none() {
            tracing::warn!(
                session_id = %session_id,
                completed = state.unique_completed_image_gens(),
                "illustration barrier never satisfied, run ends without finalized images"
            );
        }

        state
    }

    async fn run_finalize_text(&self, state: &mut StoryState) {
        self.emit(state, ProgressEvent::StageStarted {
            stage: WorkflowStage::FinalizeText,
        })
        .await;

        let finalized = finalize_text(self.text.as_ref(), state).await;
        state.finalized_text = Some(finalized.clone());

        self.emit(state, ProgressEvent::StageCompleted {
            stage: WorkflowStage::FinalizeText,
        })
        .await;
        self.emit(state, ProgressEvent::FinalizeTextReady { text: finalized })
            .await;
    }

    async fn run_finalize_images(&self, state: &mut StoryState) {
        self.emit(state, ProgressEvent::StageStarted {
            stage: WorkflowStage::FinalizeImages,
        })
        .await;

        let finalized = finalize_images(&state.chapters);
        state.finalized_images = Some(finalized.clone());

        self.emit(state, ProgressEvent::StageCompleted {
            stage: WorkflowStage::FinalizeImages,
        })
        .await;
        self.emit(state, ProgressEvent::FinalizeImagesReady { images: finalized })
            .await;
    }

    async fn emit(&self, state: &StoryState, event: ProgressEvent) {
        self.publisher.emit(&state.session_id, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::adapters::events::InMemoryProgressBus;
    use crate::adapters::image::MockImageGenerator;
    use crate::domain::foundation::SessionId;
    use crate::domain::story::{FinalizedImages, FinalizedText};

    fn base_state() -> StoryState {
        StoryState::fresh_run(SessionId::new("graph-test").unwrap(), "a brave rabbit", "")
    }

    mod predicates {
        use super::*;

        #[test]
        fn route_after_plan_splits_on_needs_info() {
            let mut state = base_state();
            assert_eq!(route_after_plan(&state), PlanRoute::Fanout);
            state.needs_info = true;
            assert_eq!(route_after_plan(&state), PlanRoute::End);
        }

        #[test]
        fn writer_barrier_requires_four_unique_completions() {
            let mut state = base_state();
            state.completed_writers = vec![1, 2, 3];
            assert_eq!(check_writers(&state), BarrierDecision::Wait);

            state.completed_writers.push(4);
            assert_eq!(check_writers(&state), BarrierDecision::Proceed);
        }

        #[test]
        fn writer_barrier_ignores_duplicate_completions() {
            let mut state = base_state();
            state.completed_writers = vec![1, 2, 2, 3, 4];
            assert_eq!(check_writers(&state), BarrierDecision::Proceed);

            state.completed_writers = vec![1, 1, 1, 1, 1];
            assert_eq!(check_writers(&state), BarrierDecision::Wait);
        }

        #[test]
        fn writer_barrier_is_idempotent_and_single_shot() {
            let mut state = base_state();
            state.completed_writers = vec![1, 2, 2, 3, 4];

            // Re-evaluating the same state gives the same answer.
            for _ in 0..5 {
                assert_eq!(check_writers(&state), BarrierDecision::Proceed);
            }

            // Once text finalization has run, the barrier never fires again.
            state.finalized_text = Some(FinalizedText { chapters: vec![] });
            for _ in 0..5 {
                assert_eq!(check_writers(&state), BarrierDecision::Wait);
            }
        }

        #[test]
        fn illustrator_barrier_is_gated_on_finalized_text() {
            let mut state = base_state();
            state.completed_image_gens = vec![1, 2, 3, 4];
            assert_eq!(check_illustrators(&state), BarrierDecision::Wait);

            state.finalized_text = Some(FinalizedText { chapters: vec![] });
            assert_eq!(check_illustrators(&state), BarrierDecision::Proceed);

            state.finalized_images = Some(FinalizedImages { chapters: vec![] });
            assert_eq!(check_illustrators(&state), BarrierDecision::Wait);
        }
    }

    mod runs {
        use super::*;

        fn story_mock() -> MockTextGenerator {
            MockTextGenerator::new()
                .on(
                    "enough information",
                    r#"{"needs_info": false, "language": "en", "story_outline": {"style": "adventure", "characters": ["Rabbit"], "setting": "forest", "plot_summary": "a journey", "chapters": [
                        {"number": 1, "title": "One", "summary": "s1", "image_description": "scene one"},
                        {"number": 2, "title": "Two", "summary": "s2", "image_description": "scene two"},
                        {"number": 3, "title": "Three", "summary": "s3", "image_description": "scene three"},
                        {"number": 4, "title": "Four", "summary": "s4", "image_description": "scene four"}
                    ]}}"#,
                )
                .on("story writer", r#"{"content": "Once upon a time..."}"#)
                .on("story editor", "not json, keep originals")
        }

        fn graph_with(
            text: MockTextGenerator,
            image: MockImageGenerator,
        ) -> (StoryGraph, InMemoryProgressBus) {
            let bus = InMemoryProgressBus::new();
            let graph = StoryGraph::new(
                Arc::new(text),
                Arc::new(image),
                Arc::new(bus.clone()),
            );
            (graph, bus)
        }

        #[tokio::test]
        async fn happy_path_runs_to_finalized_images() {
            let (graph, bus) = graph_with(story_mock(), MockImageGenerator::new());
            let state = graph.run(base_state()).await;

            assert!(!state.needs_info);
            assert_eq!(state.unique_completed_writers(), 4);
            assert_eq!(state.unique_completed_image_gens(), 4);

            let text = state.finalized_text.unwrap();
            assert_eq!(text.chapters.len(), 4);
            assert_eq!(text.chapters[0].content, "Once upon a time...");

            let images = state.finalized_images.unwrap();
            assert_eq!(images.chapters.len(), 4);
            assert!(images.chapters.iter().all(|ch| ch.image.is_some()));

            assert_eq!(bus.count_of("finalize_text_ready"), 1);
            assert_eq!(bus.count_of("finalize_images_ready"), 1);
            assert_eq!(bus.count_of("stage_completed"), 4 + 4 + 1 + 1 + 1);
        }

        #[tokio::test]
        async fn needs_info_terminates_before_fanout() {
            let text = MockTextGenerator::new().on(
                "enough information",
                r#"{"needs_info": true, "language": "en", "missing_fields": ["characters"], "suggestions": ["Who is the hero?"]}"#,
            );
            let image = MockImageGenerator::new();
            let (graph, bus) = graph_with(text, image.clone());

            let state = graph.run(base_state()).await;

            assert!(state.needs_info);
            assert!(state.story_outline.is_none());
            assert!(state.chapters.is_empty());
            assert!(state.finalized_text.is_none());
            assert_eq!(image.call_count(), 0);
            assert_eq!(bus.count_of("finalize_text_ready"), 0);
        }

        #[tokio::test]
        async fn finalize_text_triggers_exactly_once() {
            let (graph, bus) = graph_with(story_mock(), MockImageGenerator::new());
            graph.run(base_state()).await;

            let finalize_text_starts = bus
                .events()
                .into_iter()
                .filter(|(_, event)| {
                    matches!(
                        event,
                        ProgressEvent::StageStarted {
                            stage: WorkflowStage::FinalizeText
                        }
                    )
                })
                .count();
            assert_eq!(finalize_text_starts, 1);
        }

        #[tokio::test]
        async fn illustrators_start_only_after_text_finalization() {
            let (graph, bus) = graph_with(story_mock(), MockImageGenerator::new());
            graph.run(base_state()).await;

            let types: Vec<String> = bus
                .events()
                .into_iter()
                .map(|(_, event)| match event {
                    ProgressEvent::StageStarted { stage } => format!("start:{}", stage.label()),
                    ProgressEvent::FinalizeTextReady { .. } => "text_ready".to_string(),
                    _ => String::new(),
                })
                .collect();

            let text_ready_at = types.iter().position(|t| t == "text_ready").unwrap();
            for n in 1..=4 {
                let illustrator_at = types
                    .iter()
                    .position(|t| t == &format!("start:illustrator_{n}"))
                    .unwrap();
                assert!(illustrator_at > text_ready_at);
            }
        }

        #[tokio::test]
        async fn missing_image_description_stalls_illustration_without_crashing() {
            // Chapter 2 has an empty image description.
            let text = MockTextGenerator::new()
                .on(
                    "enough information",
                    r#"{"needs_info": false, "language": "en", "story_outline": {"style": "adventure", "characters": ["Rabbit"], "setting": "forest", "plot_summary": "a journey", "chapters": [
                        {"number": 1, "title": "One", "summary": "s1", "image_description": "scene one"},
                        {"number": 2, "title": "Two", "summary": "s2", "image_description": ""},
                        {"number": 3, "title": "Three", "summary": "s3", "image_description": "scene three"},
                        {"number": 4, "title": "Four", "summary": "s4", "image_description": "scene four"}
                    ]}}"#,
                )
                .on("story writer", r#"{"content": "text"}"#)
                .on("story editor", "{}");
            let (graph, bus) = graph_with(text, MockImageGenerator::new());

            let state = graph.run(base_state()).await;

            // The run terminated, text finalized, images did not.
            assert!(state.finalized_text.is_some());
            assert!(state.finalized_images.is_none());
            assert_eq!(state.unique_completed_image_gens(), 3);
            assert_eq!(bus.count_of("finalize_images_ready"), 0);
        }

        #[tokio::test]
        async fn planner_failure_still_produces_full_story() {
            // Planner gets garbage, writers succeed: the placeholder outline
            // carries the run to completion.
            let text = MockTextGenerator::new()
                .on("enough information", "no json")
                .on("story writer", r#"{"content": "written"}"#)
                .on("story editor", "{}");
            let (graph, _bus) = graph_with(text, MockImageGenerator::new());

            let state = graph.run(base_state()).await;

            assert!(state.finalized_text.is_some());
            assert!(state.finalized_images.is_some());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The writer barrier is ready exactly when all four chapter
            /// numbers appear, however many duplicates arrive and in any
            /// order.
            #[test]
            fn writer_barrier_matches_unique_membership(
                completions in proptest::collection::vec(1u32..=4, 0..20)
            ) {
                let mut state = base_state();
                state.completed_writers = completions.clone();

                let distinct: std::collections::HashSet<u32> =
                    completions.into_iter().collect();
                let expected = if distinct.len() == 4 {
                    BarrierDecision::Proceed
                } else {
                    BarrierDecision::Wait
                };
                prop_assert_eq!(check_writers(&state), expected);
            }

            /// Finalized text ordering is invariant under arrival order.
            #[test]
            fn ordered_chapters_ignore_arrival_order(
                order in Just(vec![1u32, 2, 3, 4]).prop_shuffle()
            ) {
                use crate::application::workflow::ordered_text_chapters;
                use crate::domain::story::ChapterDraft;

                let drafts: Vec<ChapterDraft> = order
                    .iter()
                    .map(|n| ChapterDraft::text(*n, format!("T{n}"), format!("C{n}")))
                    .collect();

                let ordered = ordered_text_chapters(&drafts);
                let numbers: Vec<u32> = ordered.iter().map(|ch| ch.number).collect();
                prop_assert_eq!(numbers, vec![1, 2, 3, 4]);
            }
        }
    }
}
