/// Discrete events the core hands to the presentation layer.

use serde::Serialize;

use crate::core::cue::{emit_cue, AudioSink, SoundCue};
use crate::schema::scene::{MiniGameRef, SceneId};
use crate::schema::story::StoryId;

/// The blocking activity a scene requires before the story continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Interstitial {
    Quiz { scene: SceneId },
    MiniGame { scene: SceneId, game: MiniGameRef },
}

impl Interstitial {
    pub fn scene(&self) -> SceneId {
        match self {
            Self::Quiz { scene } | Self::MiniGame { scene, .. } => *scene,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    InterstitialRequired(Interstitial),
    StoryCompleted { story: StoryId, score: u32 },
    AchievementUnlocked { id: String, points: u32 },
    Cue(SoundCue),
}

/// FIFO of pending notifications, drained by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push(notification);
    }

    pub fn cue(&mut self, cue: SoundCue) {
        self.queue.push(Notification::Cue(cue));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    /// Drain, sending every cue to `audio` and returning the rest.
    pub fn dispatch(&mut self, audio: &mut dyn AudioSink) -> Vec<Notification> {
        let mut rest = Vec::new();
        for notification in self.drain() {
            match notification {
                Notification::Cue(cue) => emit_cue(audio, cue),
                other => rest.push(other),
            }
        }
        rest
    }
}
