//! Buffer primitives the mixer is built on.
//!
//! - [`Buffer`]: a growable single-stream buffer.
//! - [`PlanarBuffer`]: one buffer per channel, the interchange format for
//!   emitters and effects.
//! - [`RingBuffer`]: a fixed number of fixed-size slots rendered ahead of the
//!   hardware callback.
//!
//! Growth is fallible: storage is reserved with `try_reserve_exact` and a
//! failed reservation surfaces as [`MixerError::ResourceAllocation`] without
//! touching the existing contents.
//!
//! [`MixerError::ResourceAllocation`]: crate::MixerError::ResourceAllocation

pub mod convert;
pub mod linear;
pub mod planar;
pub mod ring;

pub use convert::{
    double_to_float, float_to_double, interleaved_to_planar, mix_add,
    mix_interleaved_into_planar, planar_to_interleaved,
};
pub use linear::Buffer;
pub use planar::PlanarBuffer;
pub use ring::RingBuffer;

use crate::error::{MixerError, MixerResult};

/// Grows `data` to `len` elements, zero-filling new space.
///
/// Never releases capacity when shrinking.
pub(crate) fn grow_vec<T: Copy + num_traits::Zero>(
    data: &mut Vec<T>,
    len: usize,
    resource: &'static str,
) -> MixerResult<()> {
    if len > data.len() {
        data.try_reserve_exact(len - data.len())
            .map_err(|e| MixerError::allocation(resource, e.to_string()))?;
    }
    data.resize(len, T::zero());
    Ok(())
}
