//! Provider trait for surface inspection.
//!
//! Abstracts the platform that actually owns the document, allowing the
//! resolver logic to remain pure and testable.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Where a text element sits within the page structure.
///
/// Candidates inside navigation or banner landmarks are page chrome, not
/// captions, and are rejected before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Content,
    Navigation,
    Banner,
}

/// One visible text element returned by a selector query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceElement {
    pub text: String,
    pub rect: Rect,
    pub region: RegionKind,
}

/// Bounds of the primary media (video) surface, when one can be located.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaSurface {
    pub rect: Rect,
}

/// Visibility mode of a media text track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    /// Not loaded; cues are not queryable.
    Disabled,
    /// Loaded but not rendered; cues are queryable.
    Hidden,
    /// Rendered by the host player.
    Showing,
}

/// Snapshot of one media text track at the current playback time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaTrack {
    pub mode: TrackMode,
    /// Cue texts active at the current playback position.
    pub active_cues: Vec<String>,
}

/// A captured frame from the primary media surface. Pixel data is opaque
/// to this crate; only the recognition engine interprets it.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no media surface available to capture")]
    NoMediaSurface,
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
}

/// Inspection interface over a bounded surface.
///
/// Implementations wrap whatever actually renders the page (a webview
/// bridge, a DOM snapshot, a test fixture). All methods are cheap,
/// synchronous reads of the current state.
pub trait SurfaceProvider: Send + Sync {
    /// Host identifier for the surface (e.g. "youtube.com"), if known.
    fn host(&self) -> Option<String>;

    /// Title of the document backing the surface.
    fn document_title(&self) -> Option<String>;

    /// Visible viewport bounds.
    fn viewport(&self) -> Rect;

    /// Visible text elements matching `selector`.
    fn elements_matching(&self, selector: &str) -> Vec<SurfaceElement>;

    /// Bounds of the primary media surface, if one can be located.
    fn primary_media(&self) -> Option<MediaSurface>;

    /// Snapshot of the media text tracks at the current playback time.
    fn media_tracks(&self) -> Vec<MediaTrack>;

    /// Switch the track at `index` into the given mode.
    fn set_track_mode(&self, index: usize, mode: TrackMode);

    /// Texts currently announced by accessibility live regions.
    fn live_regions(&self) -> Vec<String>;

    /// Capture a frame of the primary media surface.
    fn capture_frame(&self) -> Result<FrameImage, CaptureError>;
}

/// Null implementation for testing or unsupported hosts.
pub struct NullSurface;

impl SurfaceProvider for NullSurface {
    fn host(&self) -> Option<String> {
        None
    }

    fn document_title(&self) -> Option<String> {
        None
    }

    fn viewport(&self) -> Rect {
        Rect::default()
    }

    fn elements_matching(&self, _selector: &str) -> Vec<SurfaceElement> {
        Vec::new()
    }

    fn primary_media(&self) -> Option<MediaSurface> {
        None
    }

    fn media_tracks(&self) -> Vec<MediaTrack> {
        Vec::new()
    }

    fn set_track_mode(&self, _index: usize, _mode: TrackMode) {}

    fn live_regions(&self) -> Vec<String> {
        Vec::new()
    }

    fn capture_frame(&self) -> Result<FrameImage, CaptureError> {
        Err(CaptureError::NoMediaSurface)
    }
}
