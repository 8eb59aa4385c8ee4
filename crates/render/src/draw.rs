use glam::Mat4;

use crate::scene_graph::Drawable;

/// Which uploaded mesh a draw refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Terrain,
    Cube,
}

impl MeshKind {
    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Terrain => "terrain",
            MeshKind::Cube => "cube",
        }
    }
}

/// How a draw composes with what is already in the colour target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    Opaque,
    Translucent { alpha: f32 },
}

/// One mesh draw with its composed world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshKind,
    pub world: Mat4,
    pub blend: Blend,
}

impl DrawItem {
    /// Alpha written with the fragment: 1 for opaque draws.
    pub fn alpha(&self) -> f32 {
        match self.blend {
            Blend::Opaque => 1.0,
            Blend::Translucent { alpha } => alpha,
        }
    }

    pub fn is_translucent(&self) -> bool {
        matches!(self.blend, Blend::Translucent { .. })
    }
}

/// Draws collected from one scene graph walk, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn opaque(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| !item.is_translucent())
    }

    pub fn translucent(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| item.is_translucent())
    }
}

/// Scene graph drawable that records a [`DrawItem`] for a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDraw {
    pub mesh: MeshKind,
    pub blend: Blend,
}

impl MeshDraw {
    pub fn opaque(mesh: MeshKind) -> Self {
        Self {
            mesh,
            blend: Blend::Opaque,
        }
    }

    pub fn translucent(mesh: MeshKind, alpha: f32) -> Self {
        Self {
            mesh,
            blend: Blend::Translucent { alpha },
        }
    }
}

impl Drawable<DrawList> for MeshDraw {
    fn draw(&mut self, world: &Mat4, list: &mut DrawList) {
        list.push(DrawItem {
            mesh: self.mesh,
            world: *world,
            blend: self.blend,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneNode;
    use glam::Vec3;

    #[test]
    fn scene_walk_fills_draw_list() {
        let mut root = SceneNode::new();
        root.add_child(SceneNode::new().with_drawable(MeshDraw::opaque(MeshKind::Terrain)));
        let pivot = root.add_child(
            SceneNode::new().with_transform(Mat4::from_translation(Vec3::new(0.0, 40.0, 0.0))),
        );
        root.child_mut(pivot)
            .unwrap()
            .add_child(SceneNode::new().with_drawable(MeshDraw::translucent(MeshKind::Cube, 0.75)));

        let mut list = DrawList::new();
        root.update_and_render(&Mat4::IDENTITY, &mut list);

        assert_eq!(list.len(), 2);
        assert_eq!(list.items()[0].mesh, MeshKind::Terrain);
        assert_eq!(list.items()[0].alpha(), 1.0);
        let cube = list.items()[1];
        assert_eq!(cube.mesh, MeshKind::Cube);
        assert_eq!(cube.alpha(), 0.75);
        assert_eq!(cube.world.w_axis.y, 40.0);
    }

    #[test]
    fn partitions_by_blend() {
        let mut list = DrawList::new();
        for (mesh, blend) in [
            (MeshKind::Cube, Blend::Translucent { alpha: 0.5 }),
            (MeshKind::Terrain, Blend::Opaque),
        ] {
            list.push(DrawItem {
                mesh,
                world: Mat4::IDENTITY,
                blend,
            });
        }
        let opaque: Vec<_> = list.opaque().map(|i| i.mesh).collect();
        let translucent: Vec<_> = list.translucent().map(|i| i.mesh).collect();
        assert_eq!(opaque, vec![MeshKind::Terrain]);
        assert_eq!(translucent, vec![MeshKind::Cube]);

        list.clear();
        assert!(list.is_empty());
    }
}
