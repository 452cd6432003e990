//! File playout routes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/file/decklink` | Media file played out to a DeckLink card |

use axum::{Json, Router, extract::State, routing::post};

use crate::api::models::{EncodeRequest, PipelineResponse};
use crate::api::server::AppState;
use crate::encoder::options::{DecklinkOutput, FileInput};
use crate::encoder::{InputSpec, OutputSpec, PipelineOptions};

/// Create the file router.
pub fn router() -> Router<AppState> {
    Router::new().route("/decklink", post(to_decklink))
}

/// Plays a media file from the data directory out to a DeckLink card.
async fn to_decklink(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest<FileInput, DecklinkOutput>>,
) -> Json<PipelineResponse> {
    let options = PipelineOptions {
        input: InputSpec::File(req.input),
        output: OutputSpec::Decklink(req.output),
        overlay: req.overlay,
        thumbnail: req.thumbnail,
    };
    Json(state.supervisor.start_pipeline(options).await.into())
}
