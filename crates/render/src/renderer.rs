use glam::Mat4;

use crate::draw::DrawList;
use crate::frame::{
    BlendMode, DEFAULT_CLEAR_COLOR, FramePhase, FrameSequencer, OFFSCREEN_CLEAR_COLOR,
};
use crate::lighting::DirectionalLight;
use crate::post::FULLSCREEN_QUAD;
use crate::RenderError;

/// Everything one frame needs from the scene side.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub light: &'a DirectionalLight,
    pub items: &'a DrawList,
}

impl Frame<'_> {
    /// Width over height implied by the projection matrix.
    pub fn aspect(&self) -> f32 {
        self.projection.y_axis.y / self.projection.x_axis.x
    }

    /// Vertical field of view of the projection, in degrees.
    pub fn fov_y_degrees(&self) -> f32 {
        (2.0 * (1.0 / self.projection.y_axis.y).atan()).to_degrees()
    }
}

/// Renderer-agnostic frame interface.
///
/// A renderer walks [`FramePhase::SEQUENCE`] for every frame and never
/// mutates the scene it is given.
pub trait FrameRenderer {
    type Output;

    fn render_frame(&mut self, frame: &Frame<'_>) -> Self::Output;
}

/// Renders a frame as a text trace of its phases and draws.
///
/// Used by the CLI `frame-plan` command and by tests of pass ordering.
#[derive(Debug, Default)]
pub struct TraceRenderer {
    sequencer: FrameSequencer,
}

impl TraceRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rgba(c: [f64; 4]) -> String {
    format!("({:.1}, {:.1}, {:.1}, {:.1})", c[0], c[1], c[2], c[3])
}

impl FrameRenderer for TraceRenderer {
    type Output = Result<String, RenderError>;

    fn render_frame(&mut self, frame: &Frame<'_>) -> Self::Output {
        self.sequencer.reset();
        let mut out = String::new();
        let light = frame.light.view_direction(&frame.view);

        for phase in FramePhase::SEQUENCE {
            self.sequencer.enter(phase)?;
            let state = phase.raster_state();
            let raster = state
                .map(|s| {
                    format!(
                        " depth_test={} depth_write={} blend={}",
                        s.depth_test,
                        s.depth_write,
                        match s.blend {
                            BlendMode::Off => "off",
                            BlendMode::SrcAlphaOneMinusSrcAlpha => "src_alpha,one_minus_src_alpha",
                        }
                    )
                })
                .unwrap_or_default();
            out.push_str(&format!("{}{}\n", phase.label(), raster));

            match phase {
                FramePhase::Pass1BindOffscreen => {
                    out.push_str(&format!(
                        "  aspect={:.2} fov_y={:.1}\n",
                        frame.aspect(),
                        frame.fov_y_degrees()
                    ));
                }
                FramePhase::Pass1Clear => {
                    out.push_str(&format!(
                        "  color={} depth=1.0\n",
                        rgba(OFFSCREEN_CLEAR_COLOR)
                    ));
                }
                FramePhase::Pass1DrawSkybox => out.push_str("  skybox vertices=36\n"),
                FramePhase::Pass1DrawOpaque | FramePhase::Pass1DrawTransparent => {
                    let items: Vec<_> = if phase == FramePhase::Pass1DrawOpaque {
                        frame.items.opaque().collect()
                    } else {
                        frame.items.translucent().collect()
                    };
                    for item in items {
                        let p = item.world.w_axis;
                        out.push_str(&format!(
                            "  {} alpha={:.2} at=({:.1}, {:.1}, {:.1}) light_view=({:.2}, {:.2}, {:.2})\n",
                            item.mesh.name(),
                            item.alpha(),
                            p.x,
                            p.y,
                            p.z,
                            light.x,
                            light.y,
                            light.z
                        ));
                    }
                }
                FramePhase::Pass2Clear => {
                    out.push_str(&format!("  color={}\n", rgba(DEFAULT_CLEAR_COLOR)));
                }
                FramePhase::Pass2DrawFullscreenQuad => {
                    out.push_str(&format!(
                        "  quad vertices={} effect=sepia_vignette\n",
                        FULLSCREEN_QUAD.len()
                    ));
                }
                FramePhase::Pass2BindDefault => {}
            }
        }

        self.sequencer.finish()?;
        tracing::debug!(items = frame.items.len(), "frame traced");
        Ok(out)
    }
}
