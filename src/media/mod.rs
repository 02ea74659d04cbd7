//! Decode side: the source contract plus ffmpeg and in-memory implementations.

pub mod ffmpeg;
pub mod memory;
pub mod source;
