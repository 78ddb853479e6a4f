//! One scan pass over the surface.
//!
//! Enumerates candidates from the weighted selector registry, rejects
//! page chrome, scores the rest, and exposes the non-structural fallback
//! sources (media-track cues, accessibility live regions).

use crate::score::{score_candidate, MIN_EMIT_SCORE};
use crate::selectors::SelectorRegistry;
use std::sync::Arc;
use sublens_surface::{Rect, RegionKind, SurfaceProvider, TrackMode};

/// A structural candidate that survived chrome rejection.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub text: String,
    pub rect: Rect,
    pub score: f32,
}

/// Outcome of one structural scan.
#[derive(Debug, Default)]
pub struct StructuralScan {
    /// Highest-scoring candidate that cleared the emission threshold.
    pub best: Option<ScoredCandidate>,
    /// Remaining above-threshold candidates, best first.
    pub runners_up: Vec<ScoredCandidate>,
    /// Highest score among candidates that missed the threshold.
    pub best_rejected_score: f32,
}

pub struct CandidateScanner {
    provider: Arc<dyn SurfaceProvider>,
    registry: SelectorRegistry,
}

impl CandidateScanner {
    pub fn new(provider: Arc<dyn SurfaceProvider>) -> Self {
        let registry = SelectorRegistry::for_host(provider.host().as_deref());
        Self { provider, registry }
    }

    /// Run the weighted structural scan.
    pub fn scan(&self) -> StructuralScan {
        let viewport = self.provider.viewport();
        let media = self.provider.primary_media().map(|surface| surface.rect);
        let title = self
            .provider
            .document_title()
            .map(|title| title.trim().to_string())
            .unwrap_or_default();

        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        for spec in self.registry.specs() {
            for element in self.provider.elements_matching(&spec.selector) {
                let text = element.text.trim();
                if text.is_empty() {
                    continue;
                }
                // Page chrome: headers repeating the document title, or
                // anything inside navigation/banner landmarks.
                if element.region != RegionKind::Content || (!title.is_empty() && text == title) {
                    continue;
                }

                let score = score_candidate(
                    spec.weight,
                    &element.rect,
                    text.chars().count(),
                    &viewport,
                    media.as_ref(),
                );

                // The same element often matches several selectors; keep
                // the best score per text.
                match candidates.iter_mut().find(|c| c.text == text) {
                    Some(existing) => existing.score = existing.score.max(score.0),
                    None => candidates.push(ScoredCandidate {
                        text: text.to_string(),
                        rect: element.rect,
                        score: score.0,
                    }),
                }
            }
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut scan = StructuralScan::default();
        let mut passed = candidates
            .iter()
            .filter(|c| c.score >= MIN_EMIT_SCORE)
            .cloned();
        scan.best = passed.next();
        scan.runners_up = passed.collect();
        scan.best_rejected_score = candidates
            .iter()
            .filter(|c| c.score < MIN_EMIT_SCORE)
            .map(|c| c.score)
            .fold(0.0, f32::max);

        tracing::debug!(
            candidates = candidates.len(),
            best = scan.best.as_ref().map(|c| c.text.as_str()).unwrap_or(""),
            "structural scan"
        );
        scan
    }

    /// Active media-track cue text, switching disabled tracks into a
    /// queryable mode first.
    pub fn cue_text(&self) -> Option<String> {
        let tracks = self.provider.media_tracks();
        for (index, track) in tracks.iter().enumerate() {
            if track.mode == TrackMode::Disabled {
                self.provider.set_track_mode(index, TrackMode::Hidden);
            }
        }

        // Re-read: newly hidden tracks expose their cues now.
        let tracks = self.provider.media_tracks();
        for track in &tracks {
            if track.mode == TrackMode::Disabled {
                continue;
            }
            let text = track
                .active_cues
                .iter()
                .map(|cue| cue.trim())
                .filter(|cue| !cue.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
        None
    }

    /// Longest non-empty live-region announcement, if any.
    pub fn live_region_text(&self) -> Option<String> {
        let mut regions: Vec<String> = self
            .provider
            .live_regions()
            .into_iter()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        regions.sort_by_key(|text| std::cmp::Reverse(text.len()));
        regions.into_iter().next()
    }

    pub fn provider(&self) -> &Arc<dyn SurfaceProvider> {
        &self.provider
    }
}
