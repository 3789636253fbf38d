//! Audio system using Web Audio API
//!
//! Procedurally generated cues and ambient layers - no external files needed!
//! Effects and music run through separate gain buses so settings can scale them.

use std::collections::HashMap;

use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

use crate::sim::{AmbientLayer, AudioSink, SoundCue};

/// Major pentatonic scale steps in semitones
const PENTATONIC: [f32; 5] = [0.0, 2.0, 4.0, 7.0, 9.0];
/// Root of the orb scale (C5)
const NOTE_ROOT: f32 = 523.25;
/// Ambient fade in/out time in seconds
const LAYER_FADE: f64 = 1.5;

/// Frequency for a scale degree; degrees past the scale climb an octave
pub fn note_frequency(degree: u8) -> f32 {
    let step = PENTATONIC[degree as usize % PENTATONIC.len()];
    let octave = (degree as usize / PENTATONIC.len()) as f32;
    NOTE_ROOT * 2f32.powf(octave + step / 12.0)
}

/// Tone and level of each ambient layer
fn layer_voice(layer: AmbientLayer) -> (f32, OscillatorType, f32) {
    match layer {
        AmbientLayer::Drone => (55.0, OscillatorType::Sine, 0.25),
        AmbientLayer::Pulse => (110.0, OscillatorType::Triangle, 0.12),
        AmbientLayer::Shimmer => (880.0, OscillatorType::Sine, 0.05),
        AmbientLayer::Climax => (220.0, OscillatorType::Sawtooth, 0.06),
    }
}

struct Voice {
    osc: OscillatorNode,
    gain: GainNode,
}

/// Audio manager for the game
pub struct WebAudio {
    ctx: Option<AudioContext>,
    sfx_bus: Option<GainNode>,
    music_bus: Option<GainNode>,
    layers: HashMap<AmbientLayer, Voice>,
}

impl Default for WebAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudio {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let bus = |ctx: &AudioContext| -> Option<GainNode> {
            let gain = ctx.create_gain().ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        };
        let sfx_bus = ctx.as_ref().and_then(bus);
        let music_bus = ctx.as_ref().and_then(bus);
        Self {
            ctx,
            sfx_bus,
            music_bus,
            layers: HashMap::new(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Create an oscillator with gain envelope routed into `bus`
    fn create_osc(
        ctx: &AudioContext,
        bus: &AudioNode,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(bus).ok()?;

        Some((osc, gain))
    }

    /// Short enveloped tone starting `delay` seconds from now
    fn blip(&self, freq: f32, osc_type: OscillatorType, level: f32, delay: f64, length: f64) {
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.sfx_bus) else {
            return;
        };
        let Some((osc, gain)) = Self::create_osc(ctx, bus, freq, osc_type) else {
            return;
        };
        let t = ctx.current_time() + delay;
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + length)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + length + 0.05).ok();
    }

    /// Tone whose pitch glides from `from` to `to`
    fn sweep(&self, from: f32, to: f32, osc_type: OscillatorType, level: f32, length: f64) {
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.sfx_bus) else {
            return;
        };
        let Some((osc, gain)) = Self::create_osc(ctx, bus, from, osc_type) else {
            return;
        };
        let t = ctx.current_time();
        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + length)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + length)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + length + 0.05).ok();
    }

    fn arpeggio(&self, freqs: &[f32], osc_type: OscillatorType, level: f32, spacing: f64, length: f64) {
        for (i, freq) in freqs.iter().enumerate() {
            self.blip(*freq, osc_type, level, i as f64 * spacing, length);
        }
    }
}

impl AudioSink for WebAudio {
    fn play(&mut self, cue: SoundCue) {
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            SoundCue::Note(degree) => {
                let freq = note_frequency(degree);
                self.blip(freq, OscillatorType::Sine, 0.35, 0.0, 0.6);
                // Soft octave shimmer above the note
                self.blip(freq * 2.0, OscillatorType::Sine, 0.08, 0.02, 0.4);
            }
            SoundCue::Pulse => self.sweep(300.0, 900.0, OscillatorType::Sine, 0.3, 0.35),
            SoundCue::PhotonCollect => {
                self.arpeggio(&[1200.0, 1600.0], OscillatorType::Sine, 0.15, 0.04, 0.12)
            }
            SoundCue::MeteorHit => {
                self.sweep(120.0, 40.0, OscillatorType::Sawtooth, 0.45, 0.3);
                self.blip(60.0, OscillatorType::Sine, 0.3, 0.0, 0.12);
            }
            SoundCue::CometHit => {
                self.sweep(900.0, 80.0, OscillatorType::Square, 0.25, 0.35);
                self.sweep(150.0, 30.0, OscillatorType::Sine, 0.4, 0.4);
            }
            SoundCue::SlingshotReady => {
                self.arpeggio(&[660.0, 990.0], OscillatorType::Triangle, 0.2, 0.08, 0.15)
            }
            SoundCue::SlingshotBoost => self.sweep(200.0, 1200.0, OscillatorType::Sawtooth, 0.3, 0.5),
            SoundCue::PortalOpen => {
                self.arpeggio(&[400.0, 500.0, 600.0, 800.0], OscillatorType::Triangle, 0.3, 0.1, 0.4)
            }
            SoundCue::PortalEnter => self.sweep(600.0, 200.0, OscillatorType::Sine, 0.3, 0.6),
            SoundCue::ChapterComplete => self.arpeggio(
                &[523.25, 659.25, 783.99, 1046.5, 1318.5],
                OscillatorType::Triangle,
                0.25,
                0.08,
                0.3,
            ),
            SoundCue::LightSpeed => {
                self.sweep(100.0, 2000.0, OscillatorType::Sawtooth, 0.35, 1.5);
                self.sweep(50.0, 400.0, OscillatorType::Sine, 0.4, 1.5);
            }
            SoundCue::Depleted => {
                self.arpeggio(&[400.0, 350.0, 300.0, 200.0], OscillatorType::Sine, 0.3, 0.2, 0.3)
            }
        }
    }

    fn start_ambient(&mut self, layer: AmbientLayer) {
        if self.layers.contains_key(&layer) {
            return;
        }
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.music_bus) else {
            return;
        };
        let (freq, osc_type, level) = layer_voice(layer);
        let Some((osc, gain)) = Self::create_osc(ctx, bus, freq, osc_type) else {
            return;
        };
        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.0, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(level, t + LAYER_FADE)
            .ok();
        osc.start().ok();
        self.layers.insert(layer, Voice { osc, gain });
        log::debug!("Ambient {:?} on", layer);
    }

    fn stop_ambient(&mut self, layer: AmbientLayer) {
        let Some(voice) = self.layers.remove(&layer) else {
            return;
        };
        let Some(ctx) = &self.ctx else { return };
        let t = ctx.current_time();
        let level = voice.gain.gain().value();
        voice.gain.gain().cancel_scheduled_values(t).ok();
        voice.gain.gain().set_value_at_time(level, t).ok();
        voice
            .gain
            .gain()
            .linear_ramp_to_value_at_time(0.0, t + LAYER_FADE)
            .ok();
        voice.osc.stop_with_when(t + LAYER_FADE).ok();
        log::debug!("Ambient {:?} off", layer);
    }

    fn set_volume(&mut self, music: f32, sfx: f32) {
        if let Some(bus) = &self.music_bus {
            bus.gain().set_value(music.clamp(0.0, 1.0));
        }
        if let Some(bus) = &self.sfx_bus {
            bus.gain().set_value(sfx.clamp(0.0, 1.0));
        }
    }
}
