//! Video filter fragment producers and their composition.
//!
//! Each producer inspects the overlay options and either contributes one
//! fragment of the filter graph or declines. [`combine`] preserves producer
//! order and collapses to `None` when nobody contributed, so the command
//! builder can omit the filter clause entirely.

use std::path::Path;

use super::options::OverlayOptions;

const DEFAULT_FONT_SIZE: u32 = 24;
const DEFAULT_FONT_COLOR: &str = "white";

/// Escape characters that terminate a drawtext value.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Text overlay fragment, centered near the bottom edge.
pub fn text_fragment(overlay: &OverlayOptions) -> Option<String> {
    let text = overlay.text.as_ref()?;
    Some(format!(
        "drawtext=text='{}':fontsize={}:fontcolor={}:x=(w-text_w)/2:y=h-text_h-20:box=1:boxcolor=black@0.5",
        escape_text(&text.text),
        text.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        text.color.as_deref().unwrap_or(DEFAULT_FONT_COLOR),
    ))
}

/// Image overlay fragment, anchored top-left.
pub fn image_fragment(overlay: &OverlayOptions, media_dir: &Path) -> Option<String> {
    let image = overlay.image.as_ref()?;
    let path = media_dir.join(&image.filename);
    Some(format!(
        "movie={}[logo];[in][logo]overlay=10:10",
        path.display()
    ))
}

/// QR overlay fragment, anchored top-right.
pub fn qr_fragment(overlay: &OverlayOptions, media_dir: &Path) -> Option<String> {
    let qr = overlay.qr.as_ref()?;
    let path = media_dir.join(&qr.filename);
    Some(format!(
        "movie={}[qr];[in][qr]overlay=W-w-10:10",
        path.display()
    ))
}

/// Merge fragments into one filter chain, dropping declined producers.
///
/// `None` means "no filters" and is distinct from an empty-string chain.
pub fn combine(fragments: Vec<Option<String>>) -> Option<String> {
    let kept: Vec<String> = fragments.into_iter().flatten().collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(","))
    }
}

/// Run every producer in order and combine the results.
pub fn compose(overlay: &OverlayOptions, media_dir: &Path) -> Option<String> {
    combine(vec![
        text_fragment(overlay),
        image_fragment(overlay, media_dir),
        qr_fragment(overlay, media_dir),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::options::{ImageOverlay, TextOverlay};
    use std::path::PathBuf;

    #[test]
    fn combine_preserves_producer_order() {
        let combined = combine(vec![
            Some("a".to_string()),
            None,
            Some("c".to_string()),
        ]);
        assert_eq!(combined.as_deref(), Some("a,c"));
    }

    #[test]
    fn combine_with_all_declined_signals_no_filters() {
        assert_eq!(combine(vec![None, None, None]), None);
        assert_eq!(combine(vec![]), None);
    }

    #[test]
    fn text_fragment_applies_defaults_and_escaping() {
        let overlay = OverlayOptions {
            text: Some(TextOverlay {
                text: "cam1: live".to_string(),
                font_size: None,
                color: None,
            }),
            ..OverlayOptions::default()
        };
        let fragment = text_fragment(&overlay).unwrap();
        assert!(fragment.contains("drawtext=text='cam1\\: live'"));
        assert!(fragment.contains("fontsize=24"));
        assert!(fragment.contains("fontcolor=white"));
    }

    #[test]
    fn declined_producers_return_none() {
        let overlay = OverlayOptions::default();
        assert!(text_fragment(&overlay).is_none());
        assert!(image_fragment(&overlay, Path::new("/data/media")).is_none());
        assert!(qr_fragment(&overlay, Path::new("/data/media")).is_none());
    }

    #[test]
    fn compose_orders_text_before_overlays() {
        let overlay = OverlayOptions {
            text: Some(TextOverlay {
                text: "x".to_string(),
                font_size: None,
                color: None,
            }),
            image: Some(ImageOverlay {
                filename: "logo.png".to_string(),
            }),
            qr: None,
        };
        let chain = compose(&overlay, &PathBuf::from("/data/media")).unwrap();
        let drawtext = chain.find("drawtext").unwrap();
        let logo = chain.find("movie=/data/media/logo.png").unwrap();
        assert!(drawtext < logo);
    }
}
