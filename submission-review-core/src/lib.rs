#![doc = "submission-review-core: assembles coursework submissions into one annotatable review document."]

//! This crate holds the whole submission-to-document pipeline: identity
//! extraction, file classification, normalization, template rendering,
//! typesetting and artifact merging. The CLI crate only parses arguments,
//! loads configuration and prints diagnostics.
//!
//! # Usage
//! Build a [`pipeline::ReviewPipeline`] from a [`config::ReviewConfig`] (or
//! with explicit collaborators from [`contract`]) and call
//! [`pipeline::ReviewPipeline::review`] once per submission.

pub mod classify;
pub mod compile;
pub mod config;
pub mod contract;
pub mod error;
pub mod merge;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod tools;
