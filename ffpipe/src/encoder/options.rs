//! Declarative pipeline options as accepted on the wire.
//!
//! Each streaming target gets its own options struct; the route layer picks
//! the pair matching its endpoint and wraps them in [`PipelineOptions`].
//! Validation mirrors the bounds enforced at the HTTP boundary of the
//! original service (port range, TTL/ToS, address syntax).

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest port accepted for network targets.
const MIN_PORT: u16 = 1024;

fn ip_or_fqdn() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // IPv4 dotted quad or hostname/FQDN labels.
        Regex::new(
            r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)){3}|([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*)$",
        )
        .unwrap()
    })
}

fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() || !ip_or_fqdn().is_match(address) {
        return Err(Error::validation(format!(
            "Address '{address}' must be a valid IP address or FQDN"
        )));
    }
    Ok(())
}

fn validate_port(port: u16) -> Result<()> {
    if port < MIN_PORT {
        return Err(Error::validation(format!(
            "Port {port} must be between {MIN_PORT} and 65535"
        )));
    }
    Ok(())
}

/// Reject names that would escape the data directory.
fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(Error::validation("Filename must not be empty"));
    }
    if filename.contains("..") || filename.starts_with('/') || filename.starts_with('\\') {
        return Err(Error::validation(format!(
            "Filename '{filename}' must be relative to the data directory"
        )));
    }
    Ok(())
}

// ============================================================================
// Inputs
// ============================================================================

/// DeckLink SDI capture card input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecklinkInput {
    /// Card name as reported by the DeckLink driver.
    pub card_name: String,
}

/// RTP network input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpInput {
    pub address: String,
    pub port: u16,
}

/// Media file input from the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub filename: String,
    /// Loop the input indefinitely.
    #[serde(default)]
    pub repeat: bool,
}

/// Any supported pipeline input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputSpec {
    Decklink(DecklinkInput),
    Rtp(RtpInput),
    File(FileInput),
}

impl InputSpec {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Decklink(_) => "decklink",
            Self::Rtp(_) => "rtp",
            Self::File(_) => "file",
        }
    }

    /// Short human label for descriptions ("cam1", "rtp://host:port", file name).
    pub fn label(&self) -> String {
        match self {
            Self::Decklink(input) => input.card_name.clone(),
            Self::Rtp(input) => format!("rtp://{}:{}", input.address, input.port),
            Self::File(input) => input.filename.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Decklink(input) => {
                if input.card_name.is_empty() {
                    return Err(Error::validation("Card name must not be empty"));
                }
                Ok(())
            }
            Self::Rtp(input) => {
                validate_address(&input.address)?;
                validate_port(input.port)
            }
            Self::File(input) => validate_filename(&input.filename),
        }
    }
}

// ============================================================================
// Encode settings shared by encoded outputs
// ============================================================================

/// Codec and rate-control settings, flattened into each encoded output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodeSettings {
    /// Target bitrate (e.g. "5M"); constant-bitrate bound when `vbr` is off.
    pub bitrate: Option<String>,
    /// Lower rate bound; only used when `vbr` is on.
    pub min_bitrate: Option<String>,
    /// Upper rate bound; only used when `vbr` is on.
    pub max_bitrate: Option<String>,
    /// Variable-bitrate mode; off means `minrate = maxrate = bitrate`.
    pub vbr: bool,
    /// Video codec (default libx264).
    pub codec: Option<String>,
    /// Encoder speed/quality preset (e.g. "ultrafast").
    pub encode_preset: Option<String>,
}

// ============================================================================
// Outputs
// ============================================================================

/// Encode to a file under the data output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutput {
    pub filename: String,
    /// Container format override; inferred from the extension when unset.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// SRT transport output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrtOutput {
    pub address: String,
    pub port: u16,
    /// SRT latency window in milliseconds.
    #[serde(default)]
    pub latency: Option<u32>,
    /// Connection mode: caller, listener or rendezvous.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub packet_size: Option<u32>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// Raw UDP transport output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UdpOutput {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub packet_size: Option<u32>,
    #[serde(default)]
    pub buffer: Option<u32>,
    /// Time-to-live of emitted packets.
    #[serde(default)]
    pub ttl: Option<u8>,
    /// Type-of-service byte of emitted packets.
    #[serde(default)]
    pub tos: Option<u8>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// RTP transport output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpOutput {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub packet_size: Option<u32>,
    #[serde(default)]
    pub buffer: Option<u32>,
    /// Reorder queue depth in packets.
    #[serde(default)]
    pub jitter_buffer: Option<u32>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// RTMP publish output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtmpOutput {
    pub address: String,
    /// Server port (default 1935).
    #[serde(default)]
    pub port: Option<u16>,
    /// Application path on the server.
    #[serde(default)]
    pub path: Option<String>,
    /// Stream key.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// HLS playlist output under the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HlsOutput {
    /// Playlist name; segments are written alongside it.
    pub name: String,
    /// Segment length in seconds.
    #[serde(default)]
    pub segment_duration: Option<u32>,
    /// Number of segments kept in the live playlist.
    #[serde(default)]
    pub list_size: Option<u32>,
    #[serde(flatten)]
    pub encode: EncodeSettings,
}

/// DeckLink SDI playout output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecklinkOutput {
    pub card_name: String,
}

/// Any supported pipeline output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputSpec {
    File(FileOutput),
    Srt(SrtOutput),
    Udp(UdpOutput),
    Rtp(RtpOutput),
    Rtmp(RtmpOutput),
    Hls(HlsOutput),
    Decklink(DecklinkOutput),
}

impl OutputSpec {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Srt(_) => "srt",
            Self::Udp(_) => "udp",
            Self::Rtp(_) => "rtp",
            Self::Rtmp(_) => "rtmp",
            Self::Hls(_) => "hls",
            Self::Decklink(_) => "decklink",
        }
    }

    /// Short human label for descriptions.
    pub fn label(&self) -> String {
        match self {
            Self::File(output) => output.filename.clone(),
            Self::Srt(output) => format!("srt://{}:{}", output.address, output.port),
            Self::Udp(output) => format!("udp://{}:{}", output.address, output.port),
            Self::Rtp(output) => format!("rtp://{}:{}", output.address, output.port),
            Self::Rtmp(output) => {
                format!("rtmp://{}:{}", output.address, output.port.unwrap_or(1935))
            }
            Self::Hls(output) => format!("hls:{}", output.name),
            Self::Decklink(output) => output.card_name.clone(),
        }
    }

    /// Encode settings for encoded targets; DeckLink playout is raw.
    pub fn encode_settings(&self) -> Option<&EncodeSettings> {
        match self {
            Self::File(o) => Some(&o.encode),
            Self::Srt(o) => Some(&o.encode),
            Self::Udp(o) => Some(&o.encode),
            Self::Rtp(o) => Some(&o.encode),
            Self::Rtmp(o) => Some(&o.encode),
            Self::Hls(o) => Some(&o.encode),
            Self::Decklink(_) => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::File(output) => validate_filename(&output.filename),
            Self::Srt(output) => {
                validate_address(&output.address)?;
                validate_port(output.port)
            }
            Self::Udp(output) => {
                validate_address(&output.address)?;
                validate_port(output.port)
            }
            Self::Rtp(output) => {
                validate_address(&output.address)?;
                validate_port(output.port)
            }
            Self::Rtmp(output) => {
                validate_address(&output.address)?;
                if let Some(port) = output.port {
                    validate_port(port)?;
                }
                Ok(())
            }
            Self::Hls(output) => validate_filename(&output.name),
            Self::Decklink(output) => {
                if output.card_name.is_empty() {
                    return Err(Error::validation("Card name must not be empty"));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Overlays and thumbnails
// ============================================================================

/// Text overlay burned into the picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub text: String,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Image overlay from a file in the media directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOverlay {
    pub filename: String,
}

/// QR overlay from a pre-rendered code image in the media directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrOverlay {
    pub filename: String,
}

/// Optional overlay fragments; absent fields decline to contribute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayOptions {
    pub text: Option<TextOverlay>,
    pub image: Option<ImageOverlay>,
    pub qr: Option<QrOverlay>,
}

/// Thumbnail snapshot tap configuration. Enabled by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThumbnailOptions {
    pub enabled: bool,
    /// Snapshot refresh rate in frames per second.
    pub frequency: Option<u32>,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: None,
        }
    }
}

// ============================================================================
// The full request
// ============================================================================

/// Everything needed to run one pipeline, retained on the job for restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    pub input: InputSpec,
    pub output: OutputSpec,
    #[serde(default)]
    pub overlay: OverlayOptions,
    #[serde(default)]
    pub thumbnail: ThumbnailOptions,
}

impl PipelineOptions {
    /// Exclusivity key: at most one running job per input source.
    pub fn key(&self) -> String {
        self.input.label()
    }

    /// Human description, e.g. "cam1 to RTP rtp://10.0.0.1:5000".
    pub fn description(&self) -> String {
        format!(
            "{} to {} {}",
            self.input.label(),
            self.output.kind_str().to_uppercase(),
            self.output.label()
        )
    }

    /// Display/filter tags, e.g. ["encode", "rtp", "decklink"].
    pub fn tags(&self) -> Vec<String> {
        vec![
            "encode".to_string(),
            self.output.kind_str().to_string(),
            self.input.kind_str().to_string(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        self.output.validate()?;
        if let Some(image) = &self.overlay.image {
            validate_filename(&image.filename)?;
        }
        if let Some(qr) = &self.overlay.qr {
            validate_filename(&qr.filename)?;
        }
        Ok(())
    }
}
