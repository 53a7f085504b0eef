//! Tests for rendering into the ring and serving the consumer.

use super::*;
use crate::error::MixerError;

#[test]
fn test_update_preserves_sample_order_across_slots() {
    let (mut mixer, listener) = mixer_with_source(test_config(4, 1), ramp_resource(64));
    mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
        .unwrap();

    let mut collected = Vec::new();
    let mut out = [0.0f32; 3];
    for _ in 0..10 {
        mixer.update(&mut out, 3, 1, 48000).unwrap();
        collected.extend_from_slice(&out);
    }

    let expected: Vec<f32> = (0..30).map(|i| i as f32).collect();
    assert_eq!(collected, expected);
}

#[test]
fn test_render_refuses_while_slots_pending() {
    let (mut mixer, listener) = mixer_with_source(test_config(4, 1), ramp_resource(64));
    mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
        .unwrap();

    mixer.render(4, 1, 48000).unwrap();
    assert_eq!(mixer.pending_buffers(), 2);

    let cursor = mixer.ring_write_cursor();
    let result = mixer.render(4, 1, 48000);
    assert!(matches!(result, Err(MixerError::Backpressure { pending: 2 })));
    assert_eq!(mixer.ring_write_cursor(), cursor);
    assert_eq!(mixer.pending_samples(), 8);
}

#[test]
fn test_mixer_without_listeners_fails() {
    let mut mixer = Mixer::new(test_config(4, 2)).unwrap();
    let mut out = [0.0f32; 8];

    assert!(matches!(mixer.render(4, 2, 48000), Err(MixerError::NoListeners)));
    assert!(matches!(mixer.update(&mut out, 4, 2, 48000), Err(MixerError::NoListeners)));
    assert!(matches!(
        mixer.set_mix_format(&PcmFormat::stereo_f32(44100, 256)),
        Err(MixerError::NoListeners)
    ));
}

#[test]
fn test_emitters_are_summed() {
    let (mut mixer, listener) =
        mixer_with_source(test_config(4, 2), constant_resource(0.25, 32, 2));
    for _ in 0..2 {
        mixer
            .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
            .unwrap();
    }

    let mut out = [0.0f32; 8];
    mixer.update(&mut out, 4, 2, 48000).unwrap();
    assert!(out.iter().all(|&s| s == 0.5));
}

#[test]
fn test_listeners_are_summed() {
    let mut mixer = Mixer::new(test_config(4, 1)).unwrap();
    for value in [0.5f32, 0.125] {
        let listener = mixer
            .create_listener_from_resource(Box::new(constant_resource(value, 16, 1)), None)
            .unwrap();
        mixer
            .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
            .unwrap();
    }

    let mut out = [0.0f32; 4];
    mixer.update(&mut out, 4, 1, 48000).unwrap();
    assert_eq!(out, [0.625; 4]);
}

#[test]
fn test_stopped_emitters_render_silence() {
    let (mut mixer, listener) =
        mixer_with_source(test_config(4, 2), constant_resource(0.25, 32, 2));
    mixer
        .add_emitter_to_listener(listener, Box::new(BasicEmitter::new()))
        .unwrap();

    let mut out = [1.0f32; 8];
    mixer.update(&mut out, 4, 2, 48000).unwrap();
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn test_one_shot_emitter_stops_at_end() {
    let (mut mixer, listener) = mixer_with_source(test_config(4, 1), ramp_resource(6));
    let emitter = mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::OneShot))
        .unwrap();

    let mut out = [9.0f32; 8];
    mixer.update(&mut out, 8, 1, 48000).unwrap();
    assert_eq!(out, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0]);

    let emitter = mixer.emitter_mut(listener, emitter).unwrap();
    assert_eq!(emitter.state(), EmitterState::Stopped);
    assert_eq!(emitter.position(), 0);
}

#[test]
fn test_update_underrun_zero_fills_tail() {
    let (mut mixer, listener) = mixer_with_source(test_config(4, 1), ramp_resource(64));
    mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
        .unwrap();

    let mut out = [9.0f32; 20];
    let error = mixer.update(&mut out, 20, 1, 48000).unwrap_err();
    assert!(error.is_underrun());

    let expected: Vec<f32> = (0..16).map(|i| i as f32).collect();
    assert_eq!(&out[..16], expected.as_slice());
    assert!(out[16..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_update_rejects_short_output() {
    let (mut mixer, _) = mixer_with_source(test_config(4, 2), constant_resource(0.25, 32, 2));
    let mut out = [0.0f32; 4];
    assert!(mixer.update(&mut out, 4, 2, 48000).is_err());
}

#[test]
fn test_flush_discards_pending_audio() {
    let (mut mixer, listener) = mixer_with_source(test_config(4, 1), ramp_resource(64));
    mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
        .unwrap();

    mixer.render(4, 1, 48000).unwrap();
    mixer.flush();
    assert_eq!(mixer.pending_buffers(), 0);

    let mut out = [0.0f32; 4];
    assert_eq!(mixer.read_rendered(&mut out), 0);
    assert!(mixer.render(4, 1, 48000).is_ok());
}

#[test]
fn test_record_is_unsupported() {
    let (mut mixer, _) = mixer_with_source(test_config(4, 1), ramp_resource(8));
    assert!(matches!(
        mixer.record(&[0.0; 4], 4, 1, 48000),
        Err(MixerError::Unsupported(_))
    ));
}
