//! Tests for the background render thread.

use super::*;
use crate::mixer::{RenderThread, RenderThreadConfig};
use std::thread;
use std::time::Duration;

#[test]
fn test_render_thread_serves_rendered_audio() {
    let config = test_config(4, 2);
    let thread_config = RenderThreadConfig {
        poll_interval: Duration::from_millis(1),
        lock_timeout: Duration::from_millis(50),
        ..RenderThreadConfig::for_mixer(&config)
    };
    let (mut mixer, listener) = mixer_with_source(config, constant_resource(0.25, 64, 2));
    mixer
        .add_emitter_to_listener(listener, playing_emitter(PlaybackMode::Loop))
        .unwrap();

    let mut render = RenderThread::spawn(mixer.into_shared(), thread_config).unwrap();
    assert!(render.is_running());

    let mut out = [0.0f32; 8];
    let mut served = false;
    for _ in 0..500 {
        if render.update(&mut out).is_ok() {
            served = true;
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert!(served);
    assert!(out.iter().all(|&s| s == 0.25));

    render.stop();
    assert!(!render.is_running());
}

#[test]
fn test_render_thread_zero_fills_on_underrun() {
    let mixer = Mixer::new(test_config(4, 2)).unwrap().into_shared();
    let mut render = RenderThread::spawn(mixer, RenderThreadConfig::default()).unwrap();

    let mut out = [1.0f32; 8];
    let error = render.update(&mut out).unwrap_err();
    assert!(error.is_underrun());
    assert!(out.iter().all(|&s| s == 0.0));
    render.stop();
}

#[test]
fn test_render_thread_rejects_empty_blocks() {
    let mixer = Mixer::new(test_config(4, 2)).unwrap().into_shared();
    let config = RenderThreadConfig {
        frames: 0,
        ..RenderThreadConfig::default()
    };
    assert!(RenderThread::spawn(mixer, config).is_err());
}
