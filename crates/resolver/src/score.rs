//! Candidate scoring.
//!
//! Pure domain logic: geometry and text length in, one ranking value out.

use sublens_surface::Rect;

/// Texts longer than this are unlikely to be a single subtitle line and
/// are penalized proportionally.
pub const MAX_SUBTITLE_LEN: usize = 160;

/// Elements taller than this fraction of the viewport are probably not a
/// caption strip.
pub const MAX_HEIGHT_RATIO: f32 = 0.4;

const SIZE_PENALTY_SCALE: f32 = 2.0;

/// Below this affinity a candidate is almost certainly unrelated to the
/// video and takes a hard penalty instead of a bonus.
const AFFINITY_FLOOR: f32 = 0.15;
const AFFINITY_HARD_PENALTY: f32 = 2.0;

/// Minimum score a structural candidate must clear to be emitted.
pub const MIN_EMIT_SCORE: f32 = 1.25;

/// Per-candidate ranking value for one scan pass. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore(pub f32);

impl CandidateScore {
    pub fn clears_threshold(&self) -> bool {
        self.0 >= MIN_EMIT_SCORE
    }
}

/// Score one visible element.
///
/// Terms: base selector weight, horizontal centering (near-center is
/// rewarded), vertical position (lower is rewarded), a proportional
/// penalty for over-long text, a penalty for elements spanning too much
/// of the viewport, and video affinity when a primary media surface is
/// known.
pub fn score_candidate(
    selector_weight: f32,
    rect: &Rect,
    text_len: usize,
    viewport: &Rect,
    media: Option<&Rect>,
) -> CandidateScore {
    let mut score = selector_weight;

    let (cx, cy) = rect.center();

    if viewport.width > 0.0 {
        let (vcx, _) = viewport.center();
        let half = viewport.width / 2.0;
        score += 1.0 - ((cx - vcx).abs() / half).clamp(0.0, 1.0);
    }

    if viewport.height > 0.0 {
        score += ((cy - viewport.y) / viewport.height).clamp(0.0, 1.0);

        let height_ratio = rect.height / viewport.height;
        if height_ratio > MAX_HEIGHT_RATIO {
            score -= (height_ratio - MAX_HEIGHT_RATIO) * SIZE_PENALTY_SCALE;
        }
    }

    if text_len > MAX_SUBTITLE_LEN {
        score -= (text_len - MAX_SUBTITLE_LEN) as f32 / MAX_SUBTITLE_LEN as f32;
    }

    if let Some(media) = media {
        let affinity = video_affinity(rect, media, viewport);
        if affinity < AFFINITY_FLOOR {
            score -= AFFINITY_HARD_PENALTY;
        } else {
            score += affinity;
        }
    }

    CandidateScore(score)
}

/// How strongly a candidate belongs to the video: bounding-box overlap
/// blended with normalized center-to-center distance.
fn video_affinity(rect: &Rect, media: &Rect, viewport: &Rect) -> f32 {
    let overlap = rect.overlap_ratio(media);

    let diagonal = (viewport.width.powi(2) + viewport.height.powi(2)).sqrt();
    let closeness = if diagonal > 0.0 {
        1.0 - (rect.center_distance(media) / diagonal).clamp(0.0, 1.0)
    } else {
        0.0
    };

    0.6 * overlap + 0.4 * closeness
}
