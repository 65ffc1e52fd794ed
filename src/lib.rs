//! Playlist transfer library - track resolution against the Apple Music
//! catalog and duplicate-safe insertion, shared by all binaries.

pub mod apple_music;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod insertion;
pub mod isrc;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scoring;
pub mod search;

#[cfg(test)]
mod testing;
