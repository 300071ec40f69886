//! Animation Port
//!
//! Per-instance show/hide contract. A port plays one animation at a time:
//! starting a second play while one is running is rejected with
//! `AnimationBusy`, not queued. `stop` aborts the running play.

pub mod library;

pub use library::{
    AnimationLibrary, InstantTween, Phase, TimedTween, Transition, Tween, TweenEngine,
};

use crate::error::AnimationError;
use crate::scene::SceneNode;
use async_trait::async_trait;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait AnimationPort: Send + Sync {
    async fn play_show(&self, node: &SceneNode) -> Result<(), AnimationError>;

    async fn play_hide(&self, node: &SceneNode) -> Result<(), AnimationError>;

    /// Abort the running play, if any, and clear the busy flag.
    fn stop(&self);

    fn is_playing(&self) -> bool;

    /// Disabled ports are skipped by the workflow.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct PlayState {
    next_play: u64,
    current: Option<(u64, AbortHandle)>,
}

/// Stock [`AnimationPort`] playing named transitions from an [`AnimationLibrary`].
pub struct ViewAnimator {
    library: Arc<AnimationLibrary>,
    show: String,
    hide: String,
    show_duration: Duration,
    hide_duration: Duration,
    enabled: AtomicBool,
    state: Mutex<PlayState>,
}

impl ViewAnimator {
    /// Fade in and out with the library's default durations.
    pub fn new(library: Arc<AnimationLibrary>) -> Self {
        Self {
            show: library::DEFAULT_TRANSITION.to_string(),
            hide: library::DEFAULT_TRANSITION.to_string(),
            show_duration: library.show_duration(),
            hide_duration: library.hide_duration(),
            library,
            enabled: AtomicBool::new(true),
            state: Mutex::new(PlayState::default()),
        }
    }

    pub fn with_show(mut self, name: impl Into<String>, duration: Duration) -> Self {
        self.show = name.into();
        self.show_duration = duration;
        self
    }

    pub fn with_hide(mut self, name: impl Into<String>, duration: Duration) -> Self {
        self.hide = name.into();
        self.hide_duration = duration;
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn begin(&self, node: &SceneNode) -> Result<(u64, AbortRegistration), AnimationError> {
        let mut state = self.state.lock();
        if state.current.is_some() {
            return Err(AnimationError::AnimationBusy {
                node_id: node.id().as_u64(),
            });
        }
        let play = state.next_play;
        state.next_play += 1;
        let (handle, registration) = AbortHandle::new_pair();
        state.current = Some((play, handle));
        Ok((play, registration))
    }

    fn finish(&self, play: u64) {
        let mut state = self.state.lock();
        if matches!(state.current, Some((current, _)) if current == play) {
            state.current = None;
        }
    }

    async fn play(&self, node: &SceneNode, phase: Phase) -> Result<(), AnimationError> {
        let (play, registration) = self.begin(node)?;
        let _guard = PlayGuard {
            animator: self,
            play,
        };

        let result = match phase {
            Phase::In => {
                Abortable::new(
                    self.library.show(node, &self.show, self.show_duration),
                    registration,
                )
                .await
            }
            Phase::Out => {
                Abortable::new(
                    self.library.hide(node, &self.hide, self.hide_duration),
                    registration,
                )
                .await
            }
        };

        result.map_err(|_| {
            debug!(node = %node.id(), ?phase, "Animation aborted");
            AnimationError::Cancelled
        })
    }
}

/// Clears the busy flag however the play future ends.
struct PlayGuard<'a> {
    animator: &'a ViewAnimator,
    play: u64,
}

impl Drop for PlayGuard<'_> {
    fn drop(&mut self) {
        self.animator.finish(self.play);
    }
}

#[async_trait]
impl AnimationPort for ViewAnimator {
    async fn play_show(&self, node: &SceneNode) -> Result<(), AnimationError> {
        self.play(node, Phase::In).await
    }

    async fn play_hide(&self, node: &SceneNode) -> Result<(), AnimationError> {
        self.play(node, Phase::Out).await
    }

    fn stop(&self) {
        if let Some((_, handle)) = self.state.lock().current.take() {
            handle.abort();
        }
    }

    fn is_playing(&self) -> bool {
        self.state.lock().current.is_some()
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
