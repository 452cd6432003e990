//! Encoder invocation assembly and process runtime.

pub mod command;
pub mod filters;
pub mod options;
pub mod runtime;

pub use command::{CommandContext, EncodeCommand, build_command};
pub use options::{InputSpec, OutputSpec, PipelineOptions};
pub use runtime::{EncodeEvent, EncodeHandle, EncodeProgress, EncoderRuntime, FfmpegRuntime};
