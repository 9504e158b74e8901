//! Signal storage and alignment: packed bit series, the pre-calculated
//! signal cache, and the resampler.

pub mod bits;
pub mod precalc;
pub mod resample;

pub use bits::BitSeries;
pub use precalc::{precalculate, PrecalcSeries, SignalCache};
pub use resample::{
    resample, simulation_resolution, ResampledSeries, ResampledSignalCache,
    MIN_SIM_RESOLUTION_SECS,
};
