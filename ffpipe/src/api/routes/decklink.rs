//! DeckLink capture routes: SDI input encoded to each streaming target.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/decklink/file` | Capture card to file |
//! | POST | `/api/decklink/srt` | Capture card to SRT |
//! | POST | `/api/decklink/udp` | Capture card to UDP |
//! | POST | `/api/decklink/rtp` | Capture card to RTP |
//! | POST | `/api/decklink/rtmp` | Capture card to RTMP |
//! | POST | `/api/decklink/hls` | Capture card to HLS |

use axum::{Json, Router, extract::State, routing::post};

use crate::api::models::{EncodeRequest, PipelineResponse};
use crate::api::server::AppState;
use crate::encoder::options::{
    DecklinkInput, FileOutput, HlsOutput, RtmpOutput, RtpOutput, SrtOutput, UdpOutput,
};
use crate::encoder::{InputSpec, OutputSpec, PipelineOptions};

/// Create the decklink router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/file", post(to_file))
        .route("/srt", post(to_srt))
        .route("/udp", post(to_udp))
        .route("/rtp", post(to_rtp))
        .route("/rtmp", post(to_rtmp))
        .route("/hls", post(to_hls))
}

async fn start<O>(
    state: AppState,
    req: EncodeRequest<DecklinkInput, O>,
    wrap: impl FnOnce(O) -> OutputSpec,
) -> Json<PipelineResponse> {
    let options = PipelineOptions {
        input: InputSpec::Decklink(req.input),
        output: wrap(req.output),
        overlay: req.overlay,
        thumbnail: req.thumbnail,
    };
    Json(state.supervisor.start_pipeline(options).await.into())
}

/// Takes DeckLink input in SDI and encodes it as a file.
async fn to_file(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, FileOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::File).await
}

/// Takes DeckLink input in SDI and encodes it as SRT.
async fn to_srt(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, SrtOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::Srt).await
}

/// Takes DeckLink input in SDI and encodes it as UDP.
async fn to_udp(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, UdpOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::Udp).await
}

/// Takes DeckLink input in SDI and encodes it as RTP.
async fn to_rtp(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, RtpOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::Rtp).await
}

/// Takes DeckLink input in SDI and encodes it as RTMP.
async fn to_rtmp(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, RtmpOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::Rtmp).await
}

/// Takes DeckLink input in SDI and encodes it as HLS.
async fn to_hls(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<DecklinkInput, HlsOutput>>,
) -> Json<PipelineResponse> {
    start(state, req, OutputSpec::Hls).await
}
