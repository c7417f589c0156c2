//! Keepsake Processing Library
//!
//! Wrappers around the external utilities the enrichment tasks call:
//! - Metadata probe (exiftool)
//! - Video transcoder and frame extractor (ffmpeg)
//! - Face-detection engine (external command emitting JSON)
//! - Reverse geocoder (Nominatim over HTTP)
//!
//! Every wrapper sits behind a trait so tasks can be tested with in-memory fakes.

pub mod command;
pub mod faces;
pub mod frames;
pub mod geocode;
pub mod probe;
pub mod transcode;

pub use command::{ToolCommand, ToolError, ToolOutput};
pub use faces::{CommandFaceEngine, FaceDetection, FaceEngine};
pub use frames::{FfmpegFrameExtractor, FrameExtractor, FrameInfo};
pub use geocode::{derive_place_name, Address, AddressParts, Geocoder, NominatimGeocoder};
pub use probe::{parse_probe_line, ExifToolProbe, MetadataProbe, ProbeReport};
pub use transcode::{FfmpegTranscoder, Transcoder, NORMALIZED_EXTENSION, NORMALIZED_MIME};
