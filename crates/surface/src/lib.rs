//! Bounded-surface abstraction for subtitle observation.
//!
//! A "surface" is whatever renders the video and its captions: a browser
//! viewport, an embedded webview, a player window. The resolver only needs
//! to enumerate visible text, ask for bounding boxes, and capture frames;
//! everything platform-specific stays behind [`SurfaceProvider`].

mod geometry;
mod provider;

pub use geometry::Rect;
pub use provider::{
    CaptureError, FrameImage, MediaSurface, MediaTrack, NullSurface, RegionKind, SurfaceElement,
    SurfaceProvider, TrackMode,
};
