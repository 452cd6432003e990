//! FFmpeg invocation assembly.
//!
//! A pure transform from [`PipelineOptions`] to the argument vector one
//! encoder run needs: input clause, filter chain, codec and rate-control
//! clauses, protocol-specific output clause, and an optional thumbnail
//! snapshot tap as a second output. Nothing here spawns a process.

use std::path::PathBuf;

use super::filters;
use super::options::{EncodeSettings, InputSpec, OutputSpec, PipelineOptions};
use crate::error::Result;

pub const DEFAULT_PACKET_SIZE: u32 = 1316;
pub const DEFAULT_BUFFER_SIZE: u32 = 65535;
pub const DEFAULT_JITTER_BUFFER: u32 = 25;
pub const DEFAULT_BITRATE: &str = "5M";
pub const DEFAULT_THUMBNAIL_FREQUENCY: u32 = 1;
const DEFAULT_CODEC: &str = "libx264";
const DEFAULT_RTMP_PORT: u16 = 1935;
const DEFAULT_SRT_LATENCY_MS: u32 = 250;
const DEFAULT_HLS_SEGMENT_SECS: u32 = 2;
const DEFAULT_HLS_LIST_SIZE: u32 = 5;
const RATE_CONTROL_BUFSIZE: &str = "500K";

/// Directory layout the builder resolves paths against.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub job_id: String,
    pub media_dir: PathBuf,
    pub output_dir: PathBuf,
    pub hls_dir: PathBuf,
    pub thumbnail_dir: PathBuf,
}

/// A fully-assembled encoder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCommand {
    pub args: Vec<String>,
    /// Where the snapshot tap writes, when one was requested.
    pub thumbnail_path: Option<PathBuf>,
}

impl EncodeCommand {
    /// The invocation as a single command-line string.
    pub fn rendered(&self, binary: &str) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(binary.to_string());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Build the complete argument vector for one pipeline run.
pub fn build_command(options: &PipelineOptions, ctx: &CommandContext) -> Result<EncodeCommand> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];

    push_input_clause(&mut args, &options.input, ctx);

    let filter_chain = filters::compose(&options.overlay, &ctx.media_dir);

    if let Some(settings) = options.output.encode_settings() {
        push_encode_clause(&mut args, settings);
    }

    if let Some(chain) = &filter_chain {
        args.extend(["-vf".into(), chain.clone()]);
    }

    push_output_clause(&mut args, options, ctx);

    let thumbnail_path = if options.thumbnail.enabled {
        let path = ctx.thumbnail_dir.join(format!("{}.png", ctx.job_id));
        let frequency = options
            .thumbnail
            .frequency
            .unwrap_or(DEFAULT_THUMBNAIL_FREQUENCY);
        args.extend(["-r".into(), frequency.to_string(), "-update".into(), "1".into()]);
        if let Some(chain) = &filter_chain {
            args.extend(["-vf".into(), chain.clone()]);
        }
        args.push(path.to_string_lossy().into_owned());
        Some(path)
    } else {
        None
    };

    Ok(EncodeCommand {
        args,
        thumbnail_path,
    })
}

fn push_input_clause(args: &mut Vec<String>, input: &InputSpec, ctx: &CommandContext) {
    match input {
        InputSpec::Decklink(input) => {
            args.extend([
                "-f".into(),
                "decklink".into(),
                "-protocol_whitelist".into(),
                "srt,udp,rtp".into(),
                "-stats".into(),
                "-re".into(),
                "-i".into(),
                input.card_name.clone(),
            ]);
        }
        InputSpec::Rtp(input) => {
            args.extend([
                "-protocol_whitelist".into(),
                "file,udp,rtp".into(),
                "-i".into(),
                format!("rtp://{}:{}", input.address, input.port),
            ]);
        }
        InputSpec::File(input) => {
            if input.repeat {
                args.extend(["-stream_loop".into(), "-1".into()]);
            }
            args.extend([
                "-re".into(),
                "-i".into(),
                ctx.media_dir
                    .join(&input.filename)
                    .to_string_lossy()
                    .into_owned(),
            ]);
        }
    }
}

/// Codec, bitrate and rate-control flags.
///
/// CBR pins `minrate = maxrate = bitrate`; VBR uses the explicit bounds and
/// ignores `bitrate` for the bounds entirely.
fn push_encode_clause(args: &mut Vec<String>, settings: &EncodeSettings) {
    let bitrate = settings.bitrate.as_deref().unwrap_or(DEFAULT_BITRATE);

    args.extend([
        "-c:v".into(),
        settings.codec.as_deref().unwrap_or(DEFAULT_CODEC).into(),
    ]);
    if let Some(preset) = &settings.encode_preset {
        args.extend(["-preset".into(), preset.clone()]);
    }
    args.extend(["-b:v".into(), bitrate.into()]);

    let (minrate, maxrate) = if settings.vbr {
        (
            settings.min_bitrate.as_deref().unwrap_or(DEFAULT_BITRATE),
            settings.max_bitrate.as_deref().unwrap_or(DEFAULT_BITRATE),
        )
    } else {
        (bitrate, bitrate)
    };
    args.extend([
        "-minrate".into(),
        minrate.into(),
        "-maxrate".into(),
        maxrate.into(),
        "-bufsize".into(),
        RATE_CONTROL_BUFSIZE.into(),
    ]);
}

fn push_output_clause(args: &mut Vec<String>, options: &PipelineOptions, ctx: &CommandContext) {
    match &options.output {
        OutputSpec::File(output) => {
            if let Some(format) = &output.format {
                args.extend(["-f".into(), format.clone()]);
            }
            args.push(
                ctx.output_dir
                    .join(&output.filename)
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        OutputSpec::Srt(output) => {
            args.extend(["-f".into(), "mpegts".into()]);
            args.push(format!(
                "srt://{}:{}?pkt_size={}&latency={}&mode={}",
                output.address,
                output.port,
                output.packet_size.unwrap_or(DEFAULT_PACKET_SIZE),
                output.latency.unwrap_or(DEFAULT_SRT_LATENCY_MS),
                output.mode.as_deref().unwrap_or("caller"),
            ));
        }
        OutputSpec::Udp(output) => {
            args.extend([
                "-f".into(),
                "mpegts".into(),
                "-flags".into(),
                "low_delay".into(),
                "-muxdelay".into(),
                "0".into(),
            ]);
            let mut uri = format!(
                "udp://{}:{}?pkt_size={}&buffer_size={}",
                output.address,
                output.port,
                output.packet_size.unwrap_or(DEFAULT_PACKET_SIZE),
                output.buffer.unwrap_or(DEFAULT_BUFFER_SIZE),
            );
            if let Some(ttl) = output.ttl {
                uri.push_str(&format!("&ttl={ttl}"));
            }
            if let Some(tos) = output.tos {
                uri.push_str(&format!("&tos={tos}"));
            }
            args.push(uri);
        }
        OutputSpec::Rtp(output) => {
            args.extend([
                "-f".into(),
                "rtp".into(),
                "-reorder_queue_size".into(),
                output
                    .jitter_buffer
                    .unwrap_or(DEFAULT_JITTER_BUFFER)
                    .to_string(),
                "-flags".into(),
                "low_delay".into(),
                "-muxdelay".into(),
                "0".into(),
            ]);
            args.push(format!(
                "rtp://{}:{}?pkt_size={}&buffer_size={}",
                output.address,
                output.port,
                output.packet_size.unwrap_or(DEFAULT_PACKET_SIZE),
                output.buffer.unwrap_or(DEFAULT_BUFFER_SIZE),
            ));
        }
        OutputSpec::Rtmp(output) => {
            args.extend(["-f".into(), "flv".into()]);
            let mut uri = format!(
                "rtmp://{}:{}",
                output.address,
                output.port.unwrap_or(DEFAULT_RTMP_PORT)
            );
            for segment in [output.path.as_deref(), output.key.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
            {
                uri.push('/');
                uri.push_str(segment.trim_matches('/'));
            }
            args.push(uri);
        }
        OutputSpec::Hls(output) => {
            args.extend([
                "-f".into(),
                "hls".into(),
                "-hls_time".into(),
                output
                    .segment_duration
                    .unwrap_or(DEFAULT_HLS_SEGMENT_SECS)
                    .to_string(),
                "-hls_list_size".into(),
                output.list_size.unwrap_or(DEFAULT_HLS_LIST_SIZE).to_string(),
                "-hls_flags".into(),
                "delete_segments".into(),
                "-hls_segment_filename".into(),
                ctx.hls_dir
                    .join(format!("{}_%03d.ts", output.name))
                    .to_string_lossy()
                    .into_owned(),
            ]);
            args.push(
                ctx.hls_dir
                    .join(format!("{}.m3u8", output.name))
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        OutputSpec::Decklink(output) => {
            if matches!(options.input, InputSpec::File(_)) {
                args.push("-shortest".into());
            }
            args.extend([
                "-pix_fmt".into(),
                "uyvy422".into(),
                "-s".into(),
                "1920x1080".into(),
                "-ac".into(),
                "2".into(),
                "-f".into(),
                "decklink".into(),
                "-probesize".into(),
                "32".into(),
                "-analyzeduration".into(),
                "32".into(),
                "-flags".into(),
                "low_delay".into(),
            ]);
            args.push(output.card_name.clone());
        }
    }
}
