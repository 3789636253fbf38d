//! Frame services: audio collaborator, application command bus and the
//! per-frame context handed to chapters.

use super::input::InputManager;
use super::physics::PhysicsWorld;
use super::scene::SceneGraph;

/// One-shot sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Pentatonic note by scale degree (orb pickups climb the scale)
    Note(u8),
    Pulse,
    PhotonCollect,
    MeteorHit,
    CometHit,
    SlingshotReady,
    SlingshotBoost,
    PortalOpen,
    PortalEnter,
    ChapterComplete,
    LightSpeed,
    Depleted,
}

/// Looping ambient layers, stacked as progress rises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbientLayer {
    Drone,
    Pulse,
    Shimmer,
    Climax,
}

impl AmbientLayer {
    pub const ALL: [AmbientLayer; 4] = [
        AmbientLayer::Drone,
        AmbientLayer::Pulse,
        AmbientLayer::Shimmer,
        AmbientLayer::Climax,
    ];
}

/// Interface to the audio engine
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    fn start_ambient(&mut self, layer: AmbientLayer);
    fn stop_ambient(&mut self, layer: AmbientLayer);
    /// Music and effect gains in [0, 1]
    fn set_volume(&mut self, _music: f32, _sfx: f32) {}
}

/// Requests for screen/state changes, consumed by the engine after the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    StartChapter(usize),
    RestartChapter,
    NextChapter,
    ReturnToMenu,
    TogglePause,
    /// Pause without toggling; wins over a toggle in the same frame
    Pause,
}

impl AppCommand {
    /// Parse a host command name (`restart`, `next`, `menu`, `pause`, `chapter:<n>`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "restart" => Some(AppCommand::RestartChapter),
            "next" => Some(AppCommand::NextChapter),
            "menu" => Some(AppCommand::ReturnToMenu),
            "pause" => Some(AppCommand::TogglePause),
            other => other
                .strip_prefix("chapter:")
                .and_then(|n| n.parse().ok())
                .map(AppCommand::StartChapter),
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<AppCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: AppCommand) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<AppCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Collaborators borrowed for one chapter update
pub struct FrameContext<'a> {
    pub physics: &'a mut dyn PhysicsWorld,
    pub scene: &'a mut dyn SceneGraph,
    pub audio: Option<&'a mut (dyn AudioSink + 'static)>,
    pub input: &'a InputManager,
    pub commands: &'a mut CommandQueue,
}

impl FrameContext<'_> {
    /// Play a cue if audio is present
    pub fn play(&mut self, cue: SoundCue) {
        if let Some(audio) = self.audio.as_mut() {
            audio.play(cue);
        }
    }

    pub fn start_ambient(&mut self, layer: AmbientLayer) {
        if let Some(audio) = self.audio.as_mut() {
            audio.start_ambient(layer);
        }
    }

    pub fn stop_ambient(&mut self, layer: AmbientLayer) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stop_ambient(layer);
        }
    }
}

/// Audio sink that records what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<SoundCue>,
    pub started: Vec<AmbientLayer>,
    pub stopped: Vec<AmbientLayer>,
}

impl RecordingAudio {
    pub fn count(&self, cue: SoundCue) -> usize {
        self.played.iter().filter(|c| **c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }

    fn start_ambient(&mut self, layer: AmbientLayer) {
        self.started.push(layer);
    }

    fn stop_ambient(&mut self, layer: AmbientLayer) {
        self.stopped.push(layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_names() {
        assert_eq!(AppCommand::parse("restart"), Some(AppCommand::RestartChapter));
        assert_eq!(AppCommand::parse("chapter:1"), Some(AppCommand::StartChapter(1)));
        assert_eq!(AppCommand::parse("chapter:x"), None);
        assert_eq!(AppCommand::parse("jump"), None);
    }

    #[test]
    fn test_queue_drains_in_order() {
        let mut queue = CommandQueue::new();
        queue.push(AppCommand::TogglePause);
        queue.push(AppCommand::ReturnToMenu);
        assert_eq!(queue.drain(), vec![AppCommand::TogglePause, AppCommand::ReturnToMenu]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_context_without_audio_is_silent() {
        use crate::sim::input::InputManager;
        use crate::sim::physics::PointMassWorld;
        use crate::sim::scene::RetainedScene;

        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let input = InputManager::new();
        let mut commands = CommandQueue::new();
        let mut ctx = FrameContext {
            physics: &mut physics,
            scene: &mut scene,
            audio: None,
            input: &input,
            commands: &mut commands,
        };
        ctx.play(SoundCue::Pulse);
        ctx.start_ambient(AmbientLayer::Drone);
    }
}
