//! Audio container probing
//!
//! Uses symphonia to tell "this is not decodable audio" apart from engine
//! failures before the external engine is invoked. The extension is passed
//! as the format hint, the same way the engine picks its decoder.
//!
//! Only container-level problems are reported as format errors. A codec
//! symphonia cannot decode (Opus, for one) is left to the engine, whose
//! ffmpeg-based loader handles a wider set.

use std::path::Path;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::EngineError;

/// Extensions symphonia has no demuxer for; the engine decodes these itself
const UNPROBED_EXTENSIONS: &[&str] = &["wma"];

/// Verify the file has a readable container with an audio track
///
/// Returns `EngineError::Format` when the file is not valid audio.
pub fn ensure_decodable(path: &Path) -> Result<(), EngineError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(ext) = extension.as_deref() {
        if UNPROBED_EXTENSIONS.contains(&ext) {
            tracing::debug!(path = %path.display(), "Skipping probe for extension {}", ext);
            return Ok(());
        }
    }

    let file = std::fs::File::open(path)
        .map_err(|e| EngineError::Analysis(format!("Failed to open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension.as_deref() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| EngineError::Format(format!("Failed to probe audio file: {}", e)))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::Format("No audio track found in file".to_string()))?;

    match symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default()) {
        Ok(_) => {}
        Err(SymphoniaError::Unsupported(what)) => {
            tracing::debug!(
                path = %path.display(),
                codec = ?track.codec_params.codec,
                "No local decoder ({}), deferring to engine",
                what
            );
        }
        Err(e) => return Err(EngineError::Format(format!("Invalid audio stream: {}", e))),
    }

    tracing::debug!(path = %path.display(), "Audio probe passed");
    Ok(())
}
