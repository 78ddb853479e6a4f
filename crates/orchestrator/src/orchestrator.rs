use crate::command::{Command, CommandResponse, ExplainOutcome};
use crate::error::ExplainError;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use sublens_client::ExplainBackend;
use sublens_events::{
    emit_event, event_names, DeepExplainProgressEvent, DeepExplainReadyEvent, EventBusRef,
    QuickExplainReadyEvent, RequestFailedEvent,
};
use sublens_explain::{
    cache_key, CachePolicy, Credentials, DeepExplanation, ExplainMode, ExplainRequest,
    ExplanationCache, HistoryEntry, HistoryRepository, LanguagePair, ProfileRepository,
    QuickExplanation, SettingsRepository,
};
use sublens_stream::StreamEvent;
use uuid::Uuid;

/// Outcome of one explain flow after the staleness guard has spoken.
#[derive(Debug)]
pub enum Settled<T> {
    Done { payload: T, cached: bool },
    /// A newer request took over while this one was in flight; its results
    /// were discarded without side effects.
    Superseded,
}

/// Orchestrates quick/deep explanation requests against the cache and the
/// network backend.
///
/// Cancellation is cooperative: the orchestrator owns one "current request
/// id" per mode, and any async completion for a non-current id is
/// discarded. In-flight network work is never aborted, its results are
/// simply ignored.
pub struct Orchestrator<S> {
    store: Arc<S>,
    backend: Arc<dyn ExplainBackend>,
    bus: EventBusRef,
    current_quick: Mutex<Option<Uuid>>,
    current_deep: Mutex<Option<Uuid>>,
}

impl<S> Orchestrator<S>
where
    S: ExplanationCache
        + ProfileRepository
        + SettingsRepository
        + HistoryRepository
        + Send
        + Sync
        + 'static,
{
    pub fn new(store: Arc<S>, backend: Arc<dyn ExplainBackend>, bus: EventBusRef) -> Self {
        Self {
            store,
            backend,
            bus,
            current_quick: Mutex::new(None),
            current_deep: Mutex::new(None),
        }
    }

    /// Dispatch one inbound command and build its response.
    pub async fn handle_command(&self, command: Command) -> CommandResponse {
        match command {
            Command::Explain {
                request_id,
                mode,
                subtitle_text,
                surrounding,
                profile_id,
                languages,
            } => {
                let outcome = self
                    .explain(request_id, mode, subtitle_text, surrounding, profile_id, languages)
                    .await;
                CommandResponse::Explain(outcome)
            }

            Command::StoreCredentials { api_key, base_url } => {
                let credentials = Credentials { api_key, base_url };
                match self.store.set_credentials(&credentials) {
                    Ok(()) => CommandResponse::Ack { ok: true },
                    Err(err) => error_response(err),
                }
            }

            Command::FetchProfiles => match self.store.list_profiles() {
                Ok(profiles) => CommandResponse::Profiles { profiles },
                Err(err) => error_response(err),
            },

            Command::UpsertProfile { profile } => match self.store.upsert_profile(&profile) {
                Ok(saved) => CommandResponse::Profile(Box::new(saved)),
                Err(err) => error_response(err),
            },

            Command::DeleteProfile { id } => match self.store.delete_profile(&id) {
                Ok(()) => CommandResponse::Ack { ok: true },
                Err(err) => error_response(err),
            },

            Command::FetchSettings => match self.store.cache_policy() {
                Ok(policy) => CommandResponse::Settings(policy),
                Err(err) => error_response(err),
            },

            Command::UpdateSettings {
                quick_ttl_minutes,
                max_entries,
            } => {
                let current = match self.store.cache_policy() {
                    Ok(policy) => policy,
                    Err(err) => return error_response(err),
                };
                let updated = CachePolicy {
                    quick_ttl_minutes: quick_ttl_minutes.unwrap_or(current.quick_ttl_minutes),
                    max_entries: max_entries.unwrap_or(current.max_entries),
                };
                match self.store.set_cache_policy(updated) {
                    Ok(saved) => CommandResponse::Settings(saved),
                    Err(err) => error_response(err),
                }
            }

            Command::FetchHistory => match self.store.list_history() {
                Ok(items) => CommandResponse::History { items },
                Err(err) => error_response(err),
            },

            Command::DeleteHistoryEntry { id } => match self.store.delete_history(&id) {
                Ok(()) => CommandResponse::Ack { ok: true },
                Err(err) => error_response(err),
            },

            Command::ClearHistory => match self.store.clear_history() {
                Ok(()) => CommandResponse::Ack { ok: true },
                Err(err) => error_response(err),
            },
        }
    }

    async fn explain(
        &self,
        request_id: Uuid,
        mode: ExplainMode,
        subtitle_text: String,
        surrounding: Option<String>,
        profile_id: Option<String>,
        languages: LanguagePair,
    ) -> ExplainOutcome {
        let mut request = ExplainRequest::new(mode, subtitle_text, languages);
        request.request_id = request_id;
        request.surrounding = surrounding;
        request.profile_id = profile_id;

        let result = match mode {
            ExplainMode::Quick => self
                .explain_quick(request)
                .await
                .map(|settled| settled_to_value(settled)),
            ExplainMode::Deep => self
                .explain_deep(request)
                .await
                .map(|settled| settled_to_value(settled)),
        };

        match result {
            Ok(Some((value, cached))) => ExplainOutcome::success(value, cached),
            Ok(None) => ExplainOutcome::failure("superseded by a newer request".to_string()),
            Err(err) => {
                let reason = err.reason();
                // The staleness guard also covers failures: a superseded
                // request reports nothing outward.
                if self.is_current(mode, request_id) {
                    tracing::warn!(%request_id, %mode, reason, "explain request failed");
                    emit_event(
                        self.bus.as_ref(),
                        event_names::REQUEST_FAILED,
                        &RequestFailedEvent {
                            request_id,
                            mode,
                            reason: reason.clone(),
                        },
                    );
                }
                ExplainOutcome::failure(reason)
            }
        }
    }

    /// Quick flow: cache check, credential check, completion call, cache
    /// write, notification.
    pub async fn explain_quick(
        &self,
        request: ExplainRequest,
    ) -> Result<Settled<QuickExplanation>, ExplainError> {
        self.make_current(ExplainMode::Quick, request.request_id);
        let key = cache_key(&request.subtitle_text, request.profile_id.as_deref());

        if let Some(hit) = self.store.read_quick(&key).map_err(ExplainError::cache)? {
            tracing::debug!(key, "quick cache hit");
            emit_event(
                self.bus.as_ref(),
                event_names::QUICK_EXPLAIN_READY,
                &QuickExplainReadyEvent {
                    payload: hit.clone(),
                    cached: true,
                },
            );
            return Ok(Settled::Done {
                payload: hit,
                cached: true,
            });
        }

        let credentials = self.credentials()?;
        let request = self.with_profile(request)?;
        let payload = self.backend.quick_explain(&credentials, &request).await?;

        if !self.is_current(ExplainMode::Quick, request.request_id) {
            tracing::debug!(request_id = %request.request_id, "stale quick result discarded");
            return Ok(Settled::Superseded);
        }

        self.store
            .write_quick(&key, request.profile_id.as_deref(), &payload)
            .map_err(ExplainError::cache)?;

        emit_event(
            self.bus.as_ref(),
            event_names::QUICK_EXPLAIN_READY,
            &QuickExplainReadyEvent {
                payload: payload.clone(),
                cached: false,
            },
        );
        Ok(Settled::Done {
            payload,
            cached: false,
        })
    }

    /// Deep flow: cache check, profile-variant enrichment, streaming call
    /// driven through the decoder, cache write and history on completion.
    pub async fn explain_deep(
        &self,
        request: ExplainRequest,
    ) -> Result<Settled<DeepExplanation>, ExplainError> {
        self.make_current(ExplainMode::Deep, request.request_id);
        let key = cache_key(&request.subtitle_text, request.profile_id.as_deref());

        if let Some(hit) = self.store.read_deep(&key).map_err(ExplainError::cache)? {
            tracing::debug!(key, "deep cache hit");
            emit_event(
                self.bus.as_ref(),
                event_names::DEEP_EXPLAIN_READY,
                &DeepExplainReadyEvent {
                    payload: hit.clone(),
                    cached: true,
                },
            );
            return Ok(Settled::Done {
                payload: hit,
                cached: true,
            });
        }

        let credentials = self.credentials()?;
        let request = self.enrich_with_variants(self.with_profile(request)?)?;

        let mut stream = self.backend.deep_explain(&credentials, &request).await?;
        let mut final_payload: Option<DeepExplanation> = None;

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Progress(partial) => {
                    // Progress for a superseded id is dropped, but the
                    // stream keeps draining: the call is not aborted.
                    if self.is_current(ExplainMode::Deep, request.request_id) {
                        emit_event(
                            self.bus.as_ref(),
                            event_names::DEEP_EXPLAIN_PROGRESS,
                            &DeepExplainProgressEvent {
                                request_id: request.request_id,
                                partial,
                            },
                        );
                    }
                }
                StreamEvent::Complete(payload) => final_payload = Some(*payload),
            }
        }

        let payload = final_payload.ok_or(ExplainError::StreamIncomplete)?;

        if !self.is_current(ExplainMode::Deep, request.request_id) {
            tracing::debug!(request_id = %request.request_id, "stale deep result discarded");
            return Ok(Settled::Superseded);
        }

        self.store
            .write_deep(&key, request.profile_id.as_deref(), &payload)
            .map_err(ExplainError::cache)?;

        // History is best-effort: a full log must not fail the request.
        let entry = HistoryEntry::from_deep(&request.subtitle_text, &payload);
        if let Err(err) = self.store.save_history(&entry) {
            tracing::warn!(error = %err, "failed to record history entry");
        }

        emit_event(
            self.bus.as_ref(),
            event_names::DEEP_EXPLAIN_READY,
            &DeepExplainReadyEvent {
                payload: payload.clone(),
                cached: false,
            },
        );
        Ok(Settled::Done {
            payload,
            cached: false,
        })
    }

    fn credentials(&self) -> Result<Credentials, ExplainError> {
        self.store
            .credentials()
            .map_err(ExplainError::cache)?
            .ok_or(ExplainError::MissingCredential)
    }

    /// Resolve the request's `profile_id` against the saved profiles.
    fn with_profile(&self, mut request: ExplainRequest) -> Result<ExplainRequest, ExplainError> {
        if let Some(profile_id) = request.profile_id.clone() {
            let profiles = self.store.list_profiles().map_err(ExplainError::cache)?;
            request.profile = profiles.into_iter().find(|p| p.id == profile_id);
        }
        Ok(request)
    }

    /// Attach the other saved profiles so the service can pre-compute
    /// cross-culture variants. The profile cap bounds the fan-out.
    fn enrich_with_variants(
        &self,
        mut request: ExplainRequest,
    ) -> Result<ExplainRequest, ExplainError> {
        if request.profiles.is_some() {
            return Ok(request);
        }
        let others: Vec<_> = self
            .store
            .list_profiles()
            .map_err(ExplainError::cache)?
            .into_iter()
            .filter(|profile| request.profile_id.as_deref() != Some(profile.id.as_str()))
            .collect();
        if !others.is_empty() {
            request.profiles = Some(others);
        }
        Ok(request)
    }

    fn make_current(&self, mode: ExplainMode, request_id: Uuid) {
        let mut current = match mode {
            ExplainMode::Quick => self.current_quick.lock().expect("orchestrator mutex poisoned"),
            ExplainMode::Deep => self.current_deep.lock().expect("orchestrator mutex poisoned"),
        };
        *current = Some(request_id);
    }

    fn is_current(&self, mode: ExplainMode, request_id: Uuid) -> bool {
        let current = match mode {
            ExplainMode::Quick => self.current_quick.lock().expect("orchestrator mutex poisoned"),
            ExplainMode::Deep => self.current_deep.lock().expect("orchestrator mutex poisoned"),
        };
        *current == Some(request_id)
    }
}

fn settled_to_value<T: serde::Serialize>(settled: Settled<T>) -> Option<(serde_json::Value, bool)> {
    match settled {
        Settled::Done { payload, cached } => {
            serde_json::to_value(&payload).ok().map(|value| (value, cached))
        }
        Settled::Superseded => None,
    }
}

fn error_response<E: std::error::Error>(err: E) -> CommandResponse {
    CommandResponse::Error {
        ok: false,
        error: err.to_string(),
    }
}
