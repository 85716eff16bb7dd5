//! Storyloom - Illustrated children's story generation service
//!
//! One user-supplied theme becomes a 4-chapter illustrated story through a
//! coordinated workflow: plan the outline, write the four chapters in
//! parallel, revise the whole text holistically, then illustrate the four
//! chapters in parallel. A conversational front-end classifies every turn
//! as chat, fresh generation, or regeneration, each with its own
//! state-reset policy over the persisted session.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
