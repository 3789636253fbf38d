//! Layered ambient music driven by chapter progress

use super::services::{AmbientLayer, FrameContext};

/// Layers that should be playing at `progress` (0..1)
pub fn desired_layers(progress: f32, climax: bool) -> [bool; 4] {
    [
        true,
        progress >= 0.33,
        progress >= 0.66,
        climax || progress >= 0.9,
    ]
}

#[derive(Debug, Default)]
pub struct MusicLayers {
    playing: [bool; 4],
}

impl MusicLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self, layer: AmbientLayer) -> bool {
        self.playing[layer as usize]
    }

    /// Start/stop layers so the playing set matches `progress`
    pub fn update(&mut self, progress: f32, climax: bool, ctx: &mut FrameContext) {
        let desired = desired_layers(progress, climax);
        for layer in AmbientLayer::ALL {
            let i = layer as usize;
            if desired[i] == self.playing[i] {
                continue;
            }
            if desired[i] {
                ctx.start_ambient(layer);
            } else {
                ctx.stop_ambient(layer);
            }
            self.playing[i] = desired[i];
        }
    }

    pub fn stop_all(&mut self, ctx: &mut FrameContext) {
        for layer in AmbientLayer::ALL {
            if self.playing[layer as usize] {
                ctx.stop_ambient(layer);
            }
        }
        self.playing = [false; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::input::InputManager;
    use crate::sim::physics::PointMassWorld;
    use crate::sim::scene::RetainedScene;
    use crate::sim::services::{CommandQueue, RecordingAudio};

    #[test]
    fn test_thresholds() {
        assert_eq!(desired_layers(0.0, false), [true, false, false, false]);
        assert_eq!(desired_layers(0.5, false), [true, true, false, false]);
        assert_eq!(desired_layers(0.7, false), [true, true, true, false]);
        assert_eq!(desired_layers(0.95, false), [true, true, true, true]);
        assert_eq!(desired_layers(0.1, true), [true, false, false, true]);
    }

    #[test]
    fn test_layers_start_and_stop_once() {
        let mut physics = PointMassWorld::new();
        let mut scene = RetainedScene::new();
        let mut audio = RecordingAudio::default();
        let input = InputManager::new();
        let mut commands = CommandQueue::new();
        let mut music = MusicLayers::new();
        {
            let mut ctx = FrameContext {
                physics: &mut physics,
                scene: &mut scene,
                audio: Some(&mut audio),
                input: &input,
                commands: &mut commands,
            };
            music.update(0.5, false, &mut ctx);
            music.update(0.5, false, &mut ctx);
            music.update(0.1, false, &mut ctx);
            music.stop_all(&mut ctx);
        }
        assert_eq!(audio.started, vec![AmbientLayer::Drone, AmbientLayer::Pulse]);
        assert_eq!(audio.stopped, vec![AmbientLayer::Pulse, AmbientLayer::Drone]);
        assert!(!music.is_playing(AmbientLayer::Drone));
    }
}
