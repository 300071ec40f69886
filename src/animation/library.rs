//! Named show/hide transitions.
//!
//! The tween engine itself is external ([`TweenEngine`]); the library only maps
//! transition names to tweens and toggles the node's active flag around them.

use crate::scene::SceneNode;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TRANSITION: &str = "fade";
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

/// Built-in transition effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    Fade,
    Scale,
    SlideLeft,
    SlideRight,
    SlideTop,
    SlideBottom,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::Fade,
        Transition::Scale,
        Transition::SlideLeft,
        Transition::SlideRight,
        Transition::SlideTop,
        Transition::SlideBottom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Transition::Fade => "fade",
            Transition::Scale => "scale",
            Transition::SlideLeft => "slide-left",
            Transition::SlideRight => "slide-right",
            Transition::SlideTop => "slide-top",
            Transition::SlideBottom => "slide-bottom",
        }
    }
}

/// Direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    In,
    Out,
}

/// External tween engine. `run` settles when the tween completes.
#[async_trait]
pub trait TweenEngine: Send + Sync {
    async fn run(&self, node: &SceneNode, transition: Transition, phase: Phase, duration: Duration);
}

/// Engine that settles after the tween duration has elapsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimedTween;

#[async_trait]
impl TweenEngine for TimedTween {
    async fn run(&self, _node: &SceneNode, _transition: Transition, _phase: Phase, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Engine that settles on the next poll, ignoring durations.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantTween;

#[async_trait]
impl TweenEngine for InstantTween {
    async fn run(&self, _node: &SceneNode, _transition: Transition, _phase: Phase, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}

/// A named show/hide recipe.
#[async_trait]
pub trait Tween: Send + Sync {
    async fn show(&self, node: &SceneNode, duration: Duration);
    async fn hide(&self, node: &SceneNode, duration: Duration);
}

struct EngineTween {
    transition: Transition,
    engine: Arc<dyn TweenEngine>,
}

#[async_trait]
impl Tween for EngineTween {
    async fn show(&self, node: &SceneNode, duration: Duration) {
        self.engine
            .run(node, self.transition, Phase::In, duration)
            .await;
    }

    async fn hide(&self, node: &SceneNode, duration: Duration) {
        self.engine
            .run(node, self.transition, Phase::Out, duration)
            .await;
    }
}

pub struct AnimationLibrary {
    tweens: RwLock<HashMap<String, Arc<dyn Tween>>>,
    show_duration: Duration,
    hide_duration: Duration,
}

impl AnimationLibrary {
    /// Library with the built-in transitions driven by `engine`.
    pub fn new(engine: Arc<dyn TweenEngine>) -> Self {
        Self::with_durations(engine, DEFAULT_DURATION, DEFAULT_DURATION)
    }

    pub fn with_durations(
        engine: Arc<dyn TweenEngine>,
        show_duration: Duration,
        hide_duration: Duration,
    ) -> Self {
        let tweens = Transition::ALL
            .into_iter()
            .map(|transition| {
                let tween: Arc<dyn Tween> = Arc::new(EngineTween {
                    transition,
                    engine: Arc::clone(&engine),
                });
                (transition.name().to_string(), tween)
            })
            .collect();
        Self {
            tweens: RwLock::new(tweens),
            show_duration,
            hide_duration,
        }
    }

    pub fn show_duration(&self) -> Duration {
        self.show_duration
    }

    pub fn hide_duration(&self) -> Duration {
        self.hide_duration
    }

    pub fn register(&self, name: impl Into<String>, tween: Arc<dyn Tween>) {
        self.tweens.write().insert(name.into(), tween);
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.tweens.write().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tweens.read().contains_key(name)
    }

    /// Tween registered under `name`, falling back to fade.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tween>> {
        let tweens = self.tweens.read();
        if let Some(tween) = tweens.get(name) {
            return Some(Arc::clone(tween));
        }
        warn!(animation = name, "Animation not registered, falling back to fade");
        tweens.get(DEFAULT_TRANSITION).cloned()
    }

    /// Activate `node`, then play its show tween.
    pub async fn show(&self, node: &SceneNode, name: &str, duration: Duration) {
        node.set_active(true);
        if let Some(tween) = self.resolve(name) {
            tween.show(node, duration).await;
        }
    }

    /// Play the hide tween, then deactivate `node`.
    pub async fn hide(&self, node: &SceneNode, name: &str, duration: Duration) {
        if let Some(tween) = self.resolve(name) {
            tween.hide(node, duration).await;
        }
        node.set_active(false);
    }
}
