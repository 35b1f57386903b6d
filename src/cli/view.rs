//! Text rendering of the client state for the terminal

use crate::services::io::{ImageIOService, PreviewFile};
use crate::state::ClientState;
use crate::types::ProcessingState;
use crate::supported_formats_hint;
use std::fmt::Write;

/// Human-readable byte size
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn format_dimensions(bytes: &[u8]) -> String {
    ImageIOService::image_dimensions(bytes)
        .map_or_else(|| "unknown size".to_string(), |(w, h)| format!("{}x{}", w, h))
}

/// Render the whole session as the UI would show it
pub(crate) fn render_status(state: &ClientState) -> String {
    let mut out = String::new();

    if let Some(error) = state.error() {
        let _ = writeln!(out, "! {}", error);
    }

    let _ = writeln!(
        out,
        "State: {} ({})",
        state.processing_state(),
        state.processing_state().description()
    );

    match state.selected_file() {
        None => {
            let drop_hint = if state.is_drag_over() {
                "Release to drop the image"
            } else {
                "Select or drop an image"
            };
            let _ = writeln!(out, "{}", drop_hint);
            let _ = writeln!(out, "{}", supported_formats_hint(state.max_file_size()));
        },
        Some(file) => {
            let _ = writeln!(
                out,
                "Original:  {} ({}, {}, {})",
                file.name(),
                file.mime(),
                format_size(file.size()),
                format_dimensions(file.bytes())
            );
        },
    }

    if let Some(progress) = state.visible_progress() {
        let _ = writeln!(out, "Progress:  {}% {}", progress.percent(), progress.phase().label());
    }

    if state.processing_state() == ProcessingState::Completed {
        let processed = state.result().map_or_else(
            || "unavailable".to_string(),
            |result| match result.decode() {
                Ok(bytes) => format!(
                    "{}, {}",
                    format_dimensions(&bytes),
                    format_size(bytes.len() as u64)
                ),
                Err(_) => "undecodable".to_string(),
            },
        );
        let _ = writeln!(out, "Processed: {}", processed);
    }

    out
}

/// Preview files for the before/after panels
///
/// Replacing or clearing the set deletes the files it held.
#[derive(Debug, Default)]
pub(crate) struct Previews {
    original: Option<PreviewFile>,
    processed: Option<PreviewFile>,
}

impl Previews {
    /// Write previews for whatever the state currently holds
    pub(crate) fn refresh(&mut self, state: &ClientState) -> crate::Result<()> {
        self.original = match state.selected_file() {
            Some(file) => Some(ImageIOService::write_preview(
                file.bytes(),
                extension_for(file.mime()),
            )?),
            None => None,
        };
        self.processed = match state.result() {
            Some(result) => Some(ImageIOService::write_preview(&result.decode()?, "png")?),
            None => None,
        };
        Ok(())
    }

    /// Delete all preview files
    pub(crate) fn clear(&mut self) {
        self.original = None;
        self.processed = None;
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        match &self.original {
            Some(preview) => {
                let _ = writeln!(out, "Original preview:  {}", preview.path().display());
            },
            None => out.push_str("No image selected\n"),
        }
        if let Some(preview) = &self.processed {
            let _ = writeln!(out, "Processed preview: {}", preview.path().display());
        }
        out
    }
}

fn extension_for(mime: &str) -> &str {
    mime.strip_prefix("image/")
        .map_or("bin", |sub| if sub == "jpeg" { "jpg" } else { sub })
}
