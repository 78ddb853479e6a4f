//! Scriptable surface fixture shared by scanner and resolver tests.

use std::sync::{Mutex, Once};
use sublens_surface::{
    CaptureError, FrameImage, MediaSurface, MediaTrack, Rect, RegionKind, SurfaceElement,
    SurfaceProvider, TrackMode,
};

static TRACING: Once = Once::new();

/// Install a test subscriber once so `RUST_LOG=debug` surfaces scan traces.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct FakeSurface {
    pub host: Option<String>,
    pub title: Option<String>,
    pub viewport: Rect,
    pub media: Option<MediaSurface>,
    pub frame: Option<FrameImage>,
    elements: Mutex<Vec<(String, SurfaceElement)>>,
    tracks: Mutex<Vec<MediaTrack>>,
    live: Mutex<Vec<String>>,
    mode_switches: Mutex<Vec<(usize, TrackMode)>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            host: None,
            title: None,
            viewport: Rect::new(0.0, 0.0, 1280.0, 720.0),
            media: None,
            frame: None,
            elements: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            live: Mutex::new(Vec::new()),
            mode_switches: Mutex::new(Vec::new()),
        }
    }

    pub fn add_element(&self, selector: &str, text: &str, rect: Rect, region: RegionKind) {
        self.elements.lock().unwrap().push((
            selector.to_string(),
            SurfaceElement {
                text: text.to_string(),
                rect,
                region,
            },
        ));
    }

    pub fn clear_elements(&self) {
        self.elements.lock().unwrap().clear();
    }

    pub fn set_tracks(&self, tracks: Vec<MediaTrack>) {
        *self.tracks.lock().unwrap() = tracks;
    }

    pub fn set_live_regions(&self, regions: Vec<String>) {
        *self.live.lock().unwrap() = regions;
    }

    pub fn mode_switches(&self) -> Vec<(usize, TrackMode)> {
        self.mode_switches.lock().unwrap().clone()
    }

    /// A centered caption rect low in the default viewport.
    pub fn caption_rect() -> Rect {
        Rect::new(440.0, 620.0, 400.0, 32.0)
    }
}

impl SurfaceProvider for FakeSurface {
    fn host(&self) -> Option<String> {
        self.host.clone()
    }

    fn document_title(&self) -> Option<String> {
        self.title.clone()
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn elements_matching(&self, selector: &str) -> Vec<SurfaceElement> {
        self.elements
            .lock()
            .unwrap()
            .iter()
            .filter(|(sel, _)| sel == selector)
            .map(|(_, element)| element.clone())
            .collect()
    }

    fn primary_media(&self) -> Option<MediaSurface> {
        self.media
    }

    fn media_tracks(&self) -> Vec<MediaTrack> {
        self.tracks.lock().unwrap().clone()
    }

    fn set_track_mode(&self, index: usize, mode: TrackMode) {
        self.mode_switches.lock().unwrap().push((index, mode));
        if let Some(track) = self.tracks.lock().unwrap().get_mut(index) {
            track.mode = mode;
        }
    }

    fn live_regions(&self) -> Vec<String> {
        self.live.lock().unwrap().clone()
    }

    fn capture_frame(&self) -> Result<FrameImage, CaptureError> {
        self.frame
            .clone()
            .ok_or(CaptureError::NoMediaSurface)
    }
}
