//! Rewrites FLV files with a canonical `onMetaData` header.
//!
//! Pass 1 scans the memory-mapped input, accumulating stream statistics
//! and probing codec parameters. Pass 2 writes a fresh header, the
//! assembled metadata with a pre-sized keyframe index, and the original
//! tag stream with reconstructed timestamps, then patches the index and
//! `datasize` in place and renames the temporary file over the target.

mod metadata;
mod mmap;
mod processor;
mod sink;

pub use metadata::{MetadataAssembler, ScanStats, ON_METADATA};
pub use mmap::InputMap;
pub use processor::{process, HintError, HintOptions};
pub use sink::OutputSink;
