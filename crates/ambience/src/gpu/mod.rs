//! GPU internals: context acquisition, the five pass programs, the fixed
//! offscreen target pool, the blur chain, and the crossfade machine.

mod blur;
mod compile;
mod context;
mod pipeline;
mod state;
mod targets;
mod transition;
mod uniforms;

pub(crate) use state::GpuState;
