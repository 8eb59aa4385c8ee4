//! The per-frame pass sequence.
//!
//! Pass 1 renders the 3D scene into the off-screen target; pass 2 draws the
//! full-screen quad that post-processes it onto the default surface.

use crate::RenderError;

/// Clear colour of the off-screen target.
pub const OFFSCREEN_CLEAR_COLOR: [f64; 4] = [0.1, 0.1, 0.1, 1.0];

/// Clear colour of the default surface before the post pass.
pub const DEFAULT_CLEAR_COLOR: [f64; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Scene into the off-screen colour + depth/stencil target.
    Offscreen,
    /// Post-process onto the window surface.
    Default,
}

/// Every step of a frame, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    Pass1BindOffscreen,
    Pass1Clear,
    Pass1DrawSkybox,
    Pass1DrawOpaque,
    Pass1DrawTransparent,
    Pass2BindDefault,
    Pass2Clear,
    Pass2DrawFullscreenQuad,
}

impl FramePhase {
    pub const SEQUENCE: [FramePhase; 8] = [
        FramePhase::Pass1BindOffscreen,
        FramePhase::Pass1Clear,
        FramePhase::Pass1DrawSkybox,
        FramePhase::Pass1DrawOpaque,
        FramePhase::Pass1DrawTransparent,
        FramePhase::Pass2BindDefault,
        FramePhase::Pass2Clear,
        FramePhase::Pass2DrawFullscreenQuad,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Phase that must follow this one, `None` for the last.
    pub fn next(self) -> Option<FramePhase> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }

    pub fn pass(self) -> Pass {
        match self {
            FramePhase::Pass1BindOffscreen
            | FramePhase::Pass1Clear
            | FramePhase::Pass1DrawSkybox
            | FramePhase::Pass1DrawOpaque
            | FramePhase::Pass1DrawTransparent => Pass::Offscreen,
            FramePhase::Pass2BindDefault
            | FramePhase::Pass2Clear
            | FramePhase::Pass2DrawFullscreenQuad => Pass::Default,
        }
    }

    /// Raster state for draw phases; `None` for bind and clear phases.
    pub fn raster_state(self) -> Option<RasterState> {
        match self {
            FramePhase::Pass1DrawSkybox => Some(RasterState::SKYBOX),
            FramePhase::Pass1DrawOpaque => Some(RasterState::OPAQUE),
            FramePhase::Pass1DrawTransparent => Some(RasterState::TRANSLUCENT),
            FramePhase::Pass2DrawFullscreenQuad => Some(RasterState::FULLSCREEN),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FramePhase::Pass1BindOffscreen => "pass1.bind_offscreen",
            FramePhase::Pass1Clear => "pass1.clear",
            FramePhase::Pass1DrawSkybox => "pass1.draw_skybox",
            FramePhase::Pass1DrawOpaque => "pass1.draw_opaque",
            FramePhase::Pass1DrawTransparent => "pass1.draw_transparent",
            FramePhase::Pass2BindDefault => "pass2.bind_default",
            FramePhase::Pass2Clear => "pass2.clear",
            FramePhase::Pass2DrawFullscreenQuad => "pass2.draw_fullscreen_quad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Off,
    /// `src * a + dst * (1 - a)`
    SrcAlphaOneMinusSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: BlendMode,
}

impl RasterState {
    /// Sky behind everything: tested against depth, never written.
    pub const SKYBOX: RasterState = RasterState {
        depth_test: true,
        depth_write: false,
        blend: BlendMode::Off,
    };
    pub const OPAQUE: RasterState = RasterState {
        depth_test: true,
        depth_write: true,
        blend: BlendMode::Off,
    };
    pub const TRANSLUCENT: RasterState = RasterState {
        depth_test: true,
        depth_write: true,
        blend: BlendMode::SrcAlphaOneMinusSrcAlpha,
    };
    pub const FULLSCREEN: RasterState = RasterState {
        depth_test: false,
        depth_write: false,
        blend: BlendMode::Off,
    };
}

/// Enforces [`FramePhase::SEQUENCE`] across one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameSequencer {
    current: Option<FramePhase>,
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last entered phase of the frame in progress.
    pub fn current(&self) -> Option<FramePhase> {
        self.current
    }

    /// Forget any half-finished frame.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Move to `phase`, which must directly follow the current phase.
    pub fn enter(&mut self, phase: FramePhase) -> Result<(), RenderError> {
        let expected = match self.current {
            None => Some(FramePhase::Pass1BindOffscreen),
            Some(current) => current.next(),
        };
        if expected != Some(phase) {
            return Err(RenderError::PhaseOrder {
                from: self.current,
                to: phase,
            });
        }
        self.current = Some(phase);
        Ok(())
    }

    /// Close the frame. Only valid right after the full-screen quad.
    pub fn finish(&mut self) -> Result<(), RenderError> {
        let last = self.current.take();
        if last != Some(FramePhase::Pass2DrawFullscreenQuad) {
            return Err(RenderError::IncompleteFrame(last));
        }
        Ok(())
    }
}
