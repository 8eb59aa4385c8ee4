//! wgpu backend for the heightscape demo.
//!
//! Draws a frame in two passes: the skybox, the lit terrain and the
//! translucent cube go into an off-screen [`RenderTarget`], then a full-screen
//! quad applies a sepia tone and vignette onto the output surface.
//!
//! # Invariants
//! - The off-screen colour and depth/stencil attachments always share the
//!   viewport's size; [`TwoPassRenderer::resize`] moves all three together.
//! - Frame phases run in the order enforced by
//!   [`heightscape_render::FrameSequencer`].
//! - Graphics calls come from the thread that built the renderer.
//! - An incomplete render target is logged, never fatal.

mod gpu;
mod mesh;
mod render_target;
mod shaders;
mod skybox;
mod texture;

pub use gpu::{MAX_DRAWS, TwoPassRenderer};
pub use mesh::{CUBE_EDGE, GpuMesh, Vertex, cube_geometry, terrain_vertices};
pub use render_target::{
    COLOR_FORMAT, DEPTH_STENCIL_FORMAT, RenderTarget, RenderTargetError, check_extent,
};
pub use shaders::{POST_SHADER, SCENE_SHADER, SKYBOX_SHADER};
pub use skybox::Skybox;

pub fn crate_info() -> &'static str {
    "heightscape-render-wgpu v0.1.0"
}
