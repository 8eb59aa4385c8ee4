use glam::Mat4;

/// Something a scene node can draw once its world transform is known.
///
/// `C` is the sink the draw goes into: the renderer's draw list in the app,
/// a capture buffer in tests.
pub trait Drawable<C> {
    fn draw(&mut self, world: &Mat4, ctx: &mut C);
}

impl<C, F> Drawable<C> for F
where
    F: FnMut(&Mat4, &mut C),
{
    fn draw(&mut self, world: &Mat4, ctx: &mut C) {
        self(world, ctx)
    }
}

/// A node of the transform hierarchy.
///
/// Each node owns its children outright. A node without a drawable is a
/// pure grouping or pivot node.
pub struct SceneNode<C> {
    transform: Mat4,
    children: Vec<SceneNode<C>>,
    drawable: Option<Box<dyn Drawable<C>>>,
}

impl<C> Default for SceneNode<C> {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            children: Vec::new(),
            drawable: None,
        }
    }
}

impl<C> std::fmt::Debug for SceneNode<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("transform", &self.transform)
            .field("drawable", &self.drawable.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl<C> SceneNode<C> {
    /// Node with the identity transform, no children and nothing to draw.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_drawable(mut self, drawable: impl Drawable<C> + 'static) -> Self {
        self.drawable = Some(Box::new(drawable));
        self
    }

    /// Local transform relative to the parent.
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Append a child and return its index among this node's children.
    pub fn add_child(&mut self, child: SceneNode<C>) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub fn children(&self) -> &[SceneNode<C>] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&SceneNode<C>> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut SceneNode<C>> {
        self.children.get_mut(index)
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Compose `parent_world * local`, draw this node, then recurse into the
    /// children in insertion order with the composed matrix.
    pub fn update_and_render(&mut self, parent_world: &Mat4, ctx: &mut C) {
        let world = *parent_world * self.transform;
        if let Some(drawable) = self.drawable.as_mut() {
            drawable.draw(&world, ctx);
        }
        for child in &mut self.children {
            child.update_and_render(&world, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn capture(world: &Mat4, out: &mut Vec<Mat4>) {
        out.push(*world);
    }

    #[test]
    fn child_receives_parent_times_local() {
        let t = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)) * Mat4::from_rotation_y(0.7);
        let mut root: SceneNode<Vec<Mat4>> = SceneNode::new();
        root.add_child(SceneNode::new().with_transform(t).with_drawable(capture));

        let mut seen = Vec::new();
        root.update_and_render(&Mat4::IDENTITY, &mut seen);
        assert_eq!(seen, vec![t]);
    }

    #[test]
    fn composition_order_is_parent_then_child() {
        let parent = Mat4::from_translation(Vec3::new(0.0, 40.0, 0.0));
        let child = Mat4::from_rotation_x(0.5) * Mat4::from_scale(Vec3::splat(4.0));

        let mut root = SceneNode::new().with_transform(parent);
        root.add_child(SceneNode::new().with_transform(child).with_drawable(capture));

        let mut seen = Vec::new();
        let outer = Mat4::from_rotation_z(0.25);
        root.update_and_render(&outer, &mut seen);

        assert_eq!(seen.len(), 1);
        assert!(seen[0].abs_diff_eq(outer * parent * child, 1e-5));
        assert!(!seen[0].abs_diff_eq(child * parent * outer, 1e-3));
    }

    #[test]
    fn grouping_nodes_draw_nothing() {
        let mut root: SceneNode<Vec<Mat4>> = SceneNode::new();
        let pivot = root.add_child(SceneNode::new());
        root.child_mut(pivot)
            .unwrap()
            .add_child(SceneNode::new().with_drawable(capture));

        let mut seen = Vec::new();
        root.update_and_render(&Mat4::IDENTITY, &mut seen);
        assert_eq!(seen.len(), 1);
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn children_drawn_in_order_after_parent() {
        let mut root = SceneNode::new().with_drawable(|_: &Mat4, log: &mut Vec<&'static str>| {
            log.push("root")
        });
        root.add_child(SceneNode::new().with_drawable(|_: &Mat4, log: &mut Vec<&'static str>| {
            log.push("a")
        }));
        root.add_child(SceneNode::new().with_drawable(|_: &Mat4, log: &mut Vec<&'static str>| {
            log.push("b")
        }));

        let mut log = Vec::new();
        root.update_and_render(&Mat4::IDENTITY, &mut log);
        assert_eq!(log, vec!["root", "a", "b"]);
    }

    #[test]
    fn set_transform_takes_effect_next_walk() {
        let mut root: SceneNode<Vec<Mat4>> = SceneNode::new();
        let idx = root.add_child(SceneNode::new().with_drawable(capture));

        let moved = Mat4::from_translation(Vec3::X);
        root.child_mut(idx).unwrap().set_transform(moved);

        let mut seen = Vec::new();
        root.update_and_render(&Mat4::IDENTITY, &mut seen);
        assert_eq!(seen, vec![moved]);
        assert_eq!(root.child(idx).unwrap().transform(), &moved);
    }
}
