//! RTP ingest routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/rtp/file` | RTP input recorded to a file |
//! | POST | `/api/rtp/decklink` | RTP input played out to a DeckLink card |

use axum::{Json, Router, extract::State, routing::post};

use crate::api::models::{EncodeRequest, PipelineResponse};
use crate::api::server::AppState;
use crate::encoder::options::{DecklinkOutput, FileOutput, RtpInput};
use crate::encoder::{InputSpec, OutputSpec, PipelineOptions};

/// Create the rtp router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/file", post(to_file))
        .route("/decklink", post(to_decklink))
}

/// Takes an RTP input and records it to a file.
async fn to_file(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<RtpInput, FileOutput>>,
) -> Json<PipelineResponse> {
    let options = PipelineOptions {
        input: InputSpec::Rtp(req.input),
        output: OutputSpec::File(req.output),
        overlay: req.overlay,
        thumbnail: req.thumbnail,
    };
    Json(state.supervisor.start_pipeline(options).await.into())
}

/// Takes an RTP input and outputs it to a DeckLink card.
async fn to_decklink(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<RtpInput, DecklinkOutput>>,
) -> Json<PipelineResponse> {
    let options = PipelineOptions {
        input: InputSpec::Rtp(req.input),
        output: OutputSpec::Decklink(req.output),
        overlay: req.overlay,
        thumbnail: req.thumbnail,
    };
    Json(state.supervisor.start_pipeline(options).await.into())
}
