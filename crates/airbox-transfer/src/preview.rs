//! Local file classification for previews.

use serde::Serialize;

use crate::model::FilePayload;
use crate::notify::Severity;

/// Upper bound on the text excerpt carried by a text preview.
pub const TEXT_EXCERPT_BYTES: usize = 4 * 1024;

/// Preview category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// `image/*`.
    Image,
    /// `application/pdf`.
    Pdf,
    /// Plain text.
    Text,
    /// `video/*`.
    Video,
    /// Anything else.
    Unsupported,
}

impl PreviewKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Video => "video",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Classification of a local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Category.
    pub kind: PreviewKind,
    /// Detected media type, when known.
    pub media_type: Option<String>,
    /// Leading text for text previews (lossy UTF-8).
    pub text: Option<String>,
}

impl Preview {
    /// Notification raised when the preview is shown.
    #[must_use]
    pub const fn notification(&self) -> (&'static str, Severity) {
        match self.kind {
            PreviewKind::Image => ("Image preview loaded", Severity::Info),
            PreviewKind::Pdf => ("PDF preview loaded", Severity::Info),
            PreviewKind::Text => ("Text preview loaded", Severity::Info),
            PreviewKind::Video => ("Video preview loaded", Severity::Info),
            PreviewKind::Unsupported => (
                "Unsupported file type. Please upload an image, PDF, text file, or video.",
                Severity::Error,
            ),
        }
    }
}

/// Classify `payload` by content, falling back to its extension.
#[must_use]
pub fn detect(payload: &FilePayload) -> Preview {
    let media_type = infer::get(&payload.bytes)
        .map(|kind| kind.mime_type())
        .or_else(|| {
            payload
                .name
                .extension()
                .and_then(|extension| media_type_for_extension(&extension.to_ascii_lowercase()))
        });

    let kind = media_type.map_or(PreviewKind::Unsupported, kind_for_media_type);
    let text = (kind == PreviewKind::Text).then(|| {
        let end = payload.bytes.len().min(TEXT_EXCERPT_BYTES);
        String::from_utf8_lossy(&payload.bytes[..end]).into_owned()
    });

    Preview {
        kind,
        media_type: media_type.map(str::to_string),
        text,
    }
}

fn kind_for_media_type(media_type: &str) -> PreviewKind {
    if media_type.starts_with("image/") {
        PreviewKind::Image
    } else if media_type == "application/pdf" {
        PreviewKind::Pdf
    } else if media_type.starts_with("video/") {
        PreviewKind::Video
    } else if media_type == "text/plain" || media_type == "application/json" {
        PreviewKind::Text
    } else {
        PreviewKind::Unsupported
    }
}

fn media_type_for_extension(extension: &str) -> Option<&'static str> {
    let media_type = match extension {
        "txt" | "log" | "md" | "csv" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => return None,
    };
    Some(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileName;

    fn payload(name: &str, bytes: &'static [u8]) -> FilePayload {
        FilePayload::new(FileName::new(name).expect("name"), bytes)
    }

    #[test]
    fn magic_bytes_win_over_extension() {
        let png = payload("notes.txt", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR");
        let preview = detect(&png);
        assert_eq!(preview.kind, PreviewKind::Image);
        assert_eq!(preview.media_type.as_deref(), Some("image/png"));
        assert!(preview.text.is_none());

        let pdf = payload("scan.bin", b"%PDF-1.7\n");
        assert_eq!(detect(&pdf).kind, PreviewKind::Pdf);
    }

    #[test]
    fn text_falls_back_to_extension_with_excerpt() {
        let preview = detect(&payload("README.MD", b"# airbox\n"));
        assert_eq!(preview.kind, PreviewKind::Text);
        assert_eq!(preview.text.as_deref(), Some("# airbox\n"));
        assert_eq!(preview.notification(), ("Text preview loaded", Severity::Info));
    }

    #[test]
    fn excerpt_is_capped() {
        static LARGE: [u8; TEXT_EXCERPT_BYTES * 2] = [b'a'; TEXT_EXCERPT_BYTES * 2];
        let preview = detect(&payload("big.log", &LARGE));
        assert_eq!(preview.text.map(|text| text.len()), Some(TEXT_EXCERPT_BYTES));
    }

    #[test]
    fn unknown_files_are_unsupported() {
        let preview = detect(&payload("data.xyz", b"\x01\x02\x03"));
        assert_eq!(preview.kind, PreviewKind::Unsupported);
        assert_eq!(preview.notification().1, Severity::Error);
    }
}
