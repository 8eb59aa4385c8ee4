use glam::{Mat4, Vec3};
use heightscape_common::Transform;

use crate::draw::{DrawList, MeshDraw, MeshKind};
use crate::scene_graph::SceneNode;

/// Where the cube pivot sits above the terrain.
pub const CUBE_PIVOT: Vec3 = Vec3::new(0.0, 40.0, 0.0);
pub const CUBE_SCALE: f32 = 4.0;
pub const CUBE_ALPHA: f32 = 0.75;
/// Radians the cube turns per update.
pub const CUBE_SPIN_STEP: f32 = 0.01;

const CUBE_PIVOT_INDEX: usize = 1;

/// The demo's scene graph: terrain at the origin and a spinning translucent
/// cube hanging from a pivot node.
///
/// ```text
/// root
/// ├── terrain
/// └── cube pivot (translate CUBE_PIVOT)
///     └── cube (rotate about (1, 1, 0), scale CUBE_SCALE)
/// ```
#[derive(Debug)]
pub struct DemoScene {
    root: SceneNode<DrawList>,
    angle: f32,
}

impl Default for DemoScene {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoScene {
    pub fn new() -> Self {
        let mut root = SceneNode::new();
        root.add_child(SceneNode::new().with_drawable(MeshDraw::opaque(MeshKind::Terrain)));

        let mut pivot = SceneNode::new().with_transform(Mat4::from_translation(CUBE_PIVOT));
        pivot.add_child(
            SceneNode::new()
                .with_transform(Self::cube_local(0.0))
                .with_drawable(MeshDraw::translucent(MeshKind::Cube, CUBE_ALPHA)),
        );
        let index = root.add_child(pivot);
        debug_assert_eq!(index, CUBE_PIVOT_INDEX);

        Self { root, angle: 0.0 }
    }

    /// Local transform of the cube node for a spin angle.
    pub fn cube_local(angle: f32) -> Mat4 {
        Transform::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), angle)
            .with_uniform_scale(CUBE_SCALE)
            .to_matrix()
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn root(&self) -> &SceneNode<DrawList> {
        &self.root
    }

    /// Advance the cube's spin by one step.
    pub fn update(&mut self) {
        self.angle += CUBE_SPIN_STEP;
        let local = Self::cube_local(self.angle);
        if let Some(cube) = self
            .root
            .child_mut(CUBE_PIVOT_INDEX)
            .and_then(|pivot| pivot.child_mut(0))
        {
            cube.set_transform(local);
        }
    }

    /// Walk the graph and replace the contents of `list` with this frame's draws.
    pub fn collect(&mut self, list: &mut DrawList) {
        list.clear();
        self.root.update_and_render(&Mat4::IDENTITY, list);
    }
}
