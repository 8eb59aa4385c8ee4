//! Rendering model: everything about a frame that does not need a GPU.
//!
//! # Invariants
//! - A frame runs the eight [`FramePhase`]s in order, exactly once each.
//! - Scene graph world transforms compose parent-then-child
//!   (`world = parent * local`).
//! - Lighting is evaluated in view space; the post-process constants here are
//!   the same ones the GPU shaders use.
//!
//! The wgpu backend in `heightscape-render-wgpu` drives the same
//! [`FrameSequencer`] and reads the same [`RasterState`]s, so the
//! [`TraceRenderer`] output describes exactly what the GPU path does.

mod affinity;
mod demo;
mod draw;
mod frame;
mod lighting;
mod post;
mod renderer;
mod scene_graph;

pub use affinity::ThreadAffinity;
pub use demo::{CUBE_ALPHA, CUBE_PIVOT, CUBE_SCALE, CUBE_SPIN_STEP, DemoScene};
pub use draw::{Blend, DrawItem, DrawList, MeshDraw, MeshKind};
pub use frame::{
    BlendMode, DEFAULT_CLEAR_COLOR, FramePhase, FrameSequencer, OFFSCREEN_CLEAR_COLOR, Pass,
    RasterState,
};
pub use lighting::DirectionalLight;
pub use post::{FULLSCREEN_QUAD, SepiaVignette};
pub use renderer::{Frame, FrameRenderer, TraceRenderer};
pub use scene_graph::{Drawable, SceneNode};

use std::thread::ThreadId;

/// Errors from frame sequencing and context ownership.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("frame phase {to:?} cannot follow {from:?}")]
    PhaseOrder {
        from: Option<FramePhase>,
        to: FramePhase,
    },
    #[error("frame ended in {0:?} before the full-screen pass")]
    IncompleteFrame(Option<FramePhase>),
    #[error("graphics call from thread {current:?}, context is owned by {owner:?}")]
    WrongThread { owner: ThreadId, current: ThreadId },
}

pub fn crate_info() -> &'static str {
    "heightscape-render v0.1.0"
}
