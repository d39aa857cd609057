//! Retained scene: a [`RenderBackend`] that keeps the drawn elements in a
//! sorted map so a UI layer can re-emit them in z-order.

use std::collections::BTreeMap;

use super::render::{ElementId, HitTarget, Layer, Primitive, RenderBackend, Transition};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneElement {
    pub primitive: Primitive,
    /// Transition requested by the most recent update, if any.
    pub transition: Option<Transition>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    elements: BTreeMap<ElementId, SceneElement>,
    revision: u64,
}

impl Scene {
    /// Elements in z-order (layer, then key).
    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &SceneElement)> {
        self.elements.iter()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = (&ElementId, &SceneElement)> {
        self.elements.iter().filter(move |(id, _)| id.layer == layer)
    }

    pub fn get(&self, id: &ElementId) -> Option<&SceneElement> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Topmost hit-testable shape under plot point `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitTarget> {
        self.elements.values().rev().find_map(|element| {
            let hit = element.primitive.hit()?;
            let inside = match &element.primitive {
                Primitive::Rect(rect) => {
                    (rect.x..=rect.x + rect.width).contains(&x)
                        && (rect.y..=rect.y + rect.height).contains(&y)
                }
                Primitive::Circle(circle) => {
                    (x - circle.cx).hypot(y - circle.cy) <= circle.r
                }
                _ => false,
            };
            inside.then_some(hit)
        })
    }

    /// Bumped on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Default)]
pub struct SceneBackend {
    scene: Scene,
    dirty: bool,
}

impl SceneBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn touch(&mut self) {
        self.scene.revision += 1;
        self.dirty = true;
    }
}

impl RenderBackend for SceneBackend {
    fn create(&mut self, id: &ElementId, primitive: &Primitive) {
        self.scene.elements.insert(
            id.clone(),
            SceneElement {
                primitive: primitive.clone(),
                transition: None,
            },
        );
        self.touch();
    }

    fn update(&mut self, id: &ElementId, primitive: &Primitive, transition: Option<Transition>) {
        self.scene.elements.insert(
            id.clone(),
            SceneElement {
                primitive: primitive.clone(),
                transition,
            },
        );
        self.touch();
    }

    fn remove(&mut self, id: &ElementId) {
        if self.scene.elements.remove(id).is_some() {
            self.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{CircleShape, Easing, LineShape, MarkerKey, RectShape, TextShape};

    fn text(x: f64) -> Primitive {
        Primitive::Text(TextShape {
            x,
            y: 0.0,
            text: "F1".into(),
            font_size: 12.0,
            fill: "#6b7280",
        })
    }

    #[test]
    fn test_iter_follows_z_order() {
        let mut backend = SceneBackend::new();
        backend.create(&ElementId::new(Layer::Overlay, "tooltip"), &text(0.0));
        backend.create(
            &ElementId::new(Layer::Segments, "segment-0"),
            &Primitive::Line(LineShape {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
                stroke: "#000",
                stroke_width: 1.0,
            }),
        );
        backend.create(&ElementId::new(Layer::Labels, "floor-label-1"), &text(4.0));
        let layers: Vec<Layer> = backend.scene().iter().map(|(id, _)| id.layer).collect();
        assert_eq!(layers, vec![Layer::Segments, Layer::Labels, Layer::Overlay]);
    }

    #[test]
    fn test_dirty_flag_and_revision() {
        let mut backend = SceneBackend::new();
        assert!(!backend.take_dirty());
        let id = ElementId::new(Layer::Labels, "a");
        backend.create(&id, &text(1.0));
        let transition = Transition { duration_ms: 100, easing: Easing::Linear };
        backend.update(&id, &text(2.0), Some(transition));
        assert!(backend.take_dirty());
        assert!(!backend.take_dirty());
        assert_eq!(backend.scene().revision(), 2);
        assert_eq!(backend.scene().get(&id).map(|e| e.transition), Some(Some(transition)));

        backend.remove(&id);
        assert!(backend.scene().is_empty());
        assert!(backend.take_dirty());
    }

    #[test]
    fn test_hit_test_prefers_topmost_shape() {
        let mut backend = SceneBackend::new();
        backend.create(
            &ElementId::new(Layer::Axis, "axis-hit"),
            &Primitive::Rect(RectShape {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 20.0,
                fill: "transparent",
                opacity: 1.0,
                hit: Some(HitTarget::Axis),
            }),
        );
        backend.create(
            &ElementId::new(Layer::Markers, "point-3"),
            &Primitive::Circle(CircleShape {
                cx: 50.0,
                cy: 10.0,
                r: 6.0,
                fill: "#fff",
                stroke: "#000",
                stroke_width: 2.0,
                hit: Some(HitTarget::Marker(MarkerKey::Point(3))),
            }),
        );
        backend.create(&ElementId::new(Layer::Labels, "kind-3"), &text(50.0));
        let scene = backend.scene();

        assert_eq!(scene.hit_test(52.0, 12.0), Some(HitTarget::Marker(MarkerKey::Point(3))));
        assert_eq!(scene.hit_test(57.0, 10.0), Some(HitTarget::Axis));
        assert_eq!(scene.hit_test(0.0, 10.0), Some(HitTarget::Axis));
        assert_eq!(scene.hit_test(-1.0, 10.0), None);
        assert_eq!(scene.hit_test(100.0, 30.0), None);
    }
}
