//! Layout and precision conversions between planar and interleaved audio.

use super::PlanarBuffer;
use crate::error::{MixerError, MixerResult};
use num_traits::Zero;
use std::ops::AddAssign;

/// Interleaves the first `frames` frames of `channels` planar channels into `out`.
///
/// Missing source channels are written as silence. Writing stops early if `out`
/// is shorter than `frames * channels`.
pub fn planar_to_interleaved<T: Copy + Zero>(
    planar: &PlanarBuffer<T>,
    out: &mut [T],
    frames: usize,
    channels: usize,
) {
    if channels == 0 {
        return;
    }
    for (frame_index, frame) in out.chunks_exact_mut(channels).take(frames).enumerate() {
        for (channel_index, sample) in frame.iter_mut().enumerate() {
            *sample = planar
                .channel(channel_index)
                .and_then(|c| c.get(frame_index))
                .copied()
                .unwrap_or_else(T::zero);
        }
    }
}

/// Deinterleaves `frames` frames from `data` into the first `channels` planar channels.
///
/// The planar buffer must already be large enough; frames beyond its length are dropped.
pub fn interleaved_to_planar<T: Copy + Zero>(
    data: &[T],
    planar: &mut PlanarBuffer<T>,
    frames: usize,
    channels: usize,
) {
    if channels == 0 {
        return;
    }
    for (frame_index, frame) in data.chunks_exact(channels).take(frames).enumerate() {
        for (channel_index, &sample) in frame.iter().enumerate() {
            if let Some(slot) = planar
                .channel_mut(channel_index)
                .and_then(|c| c.get_mut(frame_index))
            {
                *slot = sample;
            }
        }
    }
}

/// Sample-wise accumulate: `dst[i] += src[i]`. No clipping.
pub fn mix_add<T: Copy + AddAssign>(dst: &mut [T], src: &[T]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

/// Adds interleaved `data` into the planar buffer channel by channel.
pub fn mix_interleaved_into_planar<T: Copy + Zero + AddAssign>(
    data: &[T],
    planar: &mut PlanarBuffer<T>,
    frames: usize,
    channels: usize,
) -> MixerResult<()> {
    if channels == 0 {
        return Err(MixerError::invalid_parameter("channels", "must be non-zero"));
    }
    if data.len() < frames * channels {
        return Err(MixerError::buffer_underrun(format!(
            "interleaved input holds {} samples, {} required",
            data.len(),
            frames * channels
        )));
    }
    if planar.channel_count() < channels || planar.frames() < frames {
        return Err(MixerError::invalid_parameter(
            "planar",
            format!(
                "buffer is {}x{}, {}x{} required",
                planar.channel_count(),
                planar.frames(),
                channels,
                frames
            ),
        ));
    }
    for (frame_index, frame) in data.chunks_exact(channels).take(frames).enumerate() {
        for (channel, &sample) in planar.channels_mut().iter_mut().zip(frame) {
            channel[frame_index] += sample;
        }
    }
    Ok(())
}

/// Widens single-precision samples into `out`.
pub fn float_to_double(input: &[f32], out: &mut [f64]) {
    for (o, &i) in out.iter_mut().zip(input) {
        *o = f64::from(i);
    }
}

/// Narrows double-precision samples into `out`.
pub fn double_to_float(input: &[f64], out: &mut [f32]) {
    for (o, &i) in out.iter_mut().zip(input) {
        *o = i as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_round_trip_layout() {
        let planar =
            PlanarBuffer::from_channels(vec![vec![1.0f32, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]);
        let mut interleaved = vec![0.0f32; 6];
        planar_to_interleaved(&planar, &mut interleaved, 3, 2);
        assert_eq!(interleaved, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);

        let mut back = PlanarBuffer::with_shape(2, 3).unwrap();
        interleaved_to_planar(&interleaved, &mut back, 3, 2);
        assert_eq!(back, planar);
    }

    #[test]
    fn test_planar_to_interleaved_pads_missing_channels() {
        let planar = PlanarBuffer::from_channels(vec![vec![0.5f32, 0.5]]);
        let mut out = vec![1.0f32; 6];
        planar_to_interleaved(&planar, &mut out, 2, 3);
        assert_eq!(out, vec![0.5, 0.0, 0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_mix_add() {
        let mut a = vec![1.0f32, 2.0, 3.0];
        mix_add(&mut a, &[0.5, 0.5, 0.5]);
        assert_eq!(a, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_mix_interleaved_into_planar() {
        let mut planar = PlanarBuffer::from_channels(vec![vec![1.0f32; 2], vec![1.0; 2]]);
        mix_interleaved_into_planar(&[1.0, 2.0, 3.0, 4.0], &mut planar, 2, 2).unwrap();
        assert_eq!(&planar[0][..], &[2.0, 4.0]);
        assert_eq!(&planar[1][..], &[3.0, 5.0]);

        assert!(mix_interleaved_into_planar(&[1.0], &mut planar, 2, 2).is_err());
        assert!(mix_interleaved_into_planar(&[1.0; 6], &mut planar, 2, 3).is_err());
    }

    #[test]
    fn test_precision_conversions() {
        let mut wide = [0.0f64; 3];
        float_to_double(&[0.5, -0.25, 1.0], &mut wide);
        assert_eq!(wide, [0.5, -0.25, 1.0]);

        let mut narrow = [0.0f32; 3];
        double_to_float(&wide, &mut narrow);
        assert_eq!(narrow, [0.5, -0.25, 1.0]);
    }
}
