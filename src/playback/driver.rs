use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::progress::CourseProgress;

use super::debounce::Debouncer;

/// How often the active media element is sampled while playing.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);
/// Quiet window before a sampled position is actually sent.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    pub position: f64,
    pub duration: f64,
}

/// The driver's view of the host player. `status` returns `None` while the
/// media resource is still loading; no sample is taken then.
pub trait PlaybackSource: Send + Sync {
    fn status(&self) -> Option<PlaybackStatus>;
}

/// Bridges a playing media element to the progress tracker without
/// overwhelming the network: a fixed-interval sampler feeding a trailing-edge
/// debounce, with an immediate bypass on playback end.
pub struct PlaybackSyncDriver {
    progress: Arc<CourseProgress>,
    debouncer: Arc<Debouncer>,
    sample_interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    active_lecture: Option<String>,
    /// Lectures already resumed this session; a reload of the same source
    /// must not seek again.
    resumed: HashSet<String>,
}

impl PlaybackSyncDriver {
    pub fn new(progress: Arc<CourseProgress>) -> Self {
        Self::with_timing(progress, SAMPLE_INTERVAL, DEBOUNCE_WINDOW)
    }

    pub fn with_timing(
        progress: Arc<CourseProgress>,
        sample_interval: Duration,
        debounce_window: Duration,
    ) -> Self {
        Self {
            progress,
            debouncer: Arc::new(Debouncer::new(debounce_window)),
            sample_interval,
            handle: None,
            cancel_token: None,
            active_lecture: None,
            resumed: HashSet::new(),
        }
    }

    pub fn active_lecture(&self) -> Option<&str> {
        self.active_lecture.as_deref()
    }

    /// Starts sampling `source` for the given lecture, tearing down any
    /// previous loop first. Returns the position the player should seek to,
    /// at most once per lecture per session.
    pub async fn attach(
        &mut self,
        lecture_id: &str,
        source: Arc<dyn PlaybackSource>,
    ) -> Result<Option<f64>> {
        self.stop_sampling().await?;

        let resume = if self.resumed.insert(lecture_id.to_string()) {
            self.progress
                .record_for(lecture_id)
                .map(|record| record.position)
                .filter(|position| *position > 0.0)
        } else {
            None
        };

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let progress = self.progress.clone();
        let debouncer = self.debouncer.clone();
        let sample_interval = self.sample_interval;
        let lecture = lecture_id.to_string();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sample_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        // Skip the tick entirely while the media is loading.
                        let Some(status) = source.status() else { continue };
                        let progress = progress.clone();
                        let lecture = lecture.clone();
                        debouncer.push(status, move |sample| async move {
                            if let Err(err) = progress
                                .record(&lecture, sample.position, sample.duration)
                                .await
                            {
                                warn!("Failed to save progress for {lecture}: {err}");
                            }
                        });
                    }
                }
            }
        });

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.active_lecture = Some(lecture_id.to_string());
        Ok(resume)
    }

    /// Playback finished: drop any pending debounced sample, record
    /// `position = duration` immediately, then advance to the next lecture.
    /// The caller re-attaches once the next source is ready.
    pub async fn handle_ended(&mut self, duration: f64) -> Result<Option<String>> {
        let Some(lecture_id) = self.active_lecture.clone() else {
            return Ok(None);
        };

        self.stop_sampling().await?;

        if let Err(err) = self.progress.record(&lecture_id, duration, duration).await {
            warn!("Failed to mark {lecture_id} complete: {err}");
            return Ok(None);
        }
        if let Err(err) = self.progress.refresh().await {
            warn!("Failed to reload progress after {lecture_id} ended: {err}");
        }

        let next = self.progress.resolve_next().await;
        if let Some(next) = &next {
            self.active_lecture = Some(next.id.clone());
        }
        Ok(next.map(|lecture| lecture.id))
    }

    /// Explicit cancellation boundary for unmount: stops the sampler and
    /// drops any pending debounced call.
    pub async fn detach(&mut self) -> Result<()> {
        self.stop_sampling().await?;
        self.active_lecture = None;
        Ok(())
    }

    async fn stop_sampling(&mut self) -> Result<()> {
        self.debouncer.cancel();
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling task failed to join")?;
        }
        Ok(())
    }
}
