//! Backend-agnostic render engine.
//!
//! The engine keeps the last primitive it sent for every element and
//! reconciles a layer's desired elements against it: unchanged elements are
//! left alone, changed ones are updated in place, new keys are created and
//! vanished keys removed. Drawing the same state twice therefore issues no
//! backend calls at all.

use std::collections::{BTreeMap, BTreeSet};

/// Z-order, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Segments,
    Axis,
    Ticks,
    Markers,
    Labels,
    Progress,
    Overlay,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    pub layer: Layer,
    pub key: String,
}

impl ElementId {
    pub fn new(layer: Layer, key: impl Into<String>) -> Self {
        Self {
            layer,
            key: key.into(),
        }
    }
}

/// Identity of a clickable marker: the source row it was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerKey {
    Point(usize),
    Boundary(usize),
}

/// What a pointer event on an element refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitTarget {
    Axis,
    Marker(MarkerKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualState {
    Past,
    Future,
}

impl VisualState {
    /// Inclusive: a marker at the current position is already past.
    pub fn classify(marker_seconds: u32, current_seconds: f64) -> Self {
        if marker_seconds as f64 <= current_seconds {
            VisualState::Past
        } else {
            VisualState::Future
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    CubicInOut,
}

impl Easing {
    pub fn css(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::CubicInOut => "cubic-bezier(0.65, 0, 0.35, 1)",
        }
    }
}

/// Non-blocking animation hint for an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub duration_ms: u64,
    pub easing: Easing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineShape {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: &'static str,
    pub stroke_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: &'static str,
    pub opacity: f64,
    pub hit: Option<HitTarget>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircleShape {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub hit: Option<HitTarget>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    pub x: f64,
    pub y: f64,
    /// Centered on `x`.
    pub text: String,
    pub font_size: f64,
    pub fill: &'static str,
}

/// Floating tooltip box, positioned in container coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayShape {
    pub x: f64,
    pub y: f64,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Line(LineShape),
    Rect(RectShape),
    Circle(CircleShape),
    Text(TextShape),
    Overlay(OverlayShape),
}

impl Primitive {
    pub fn hit(&self) -> Option<HitTarget> {
        match self {
            Primitive::Rect(rect) => rect.hit,
            Primitive::Circle(circle) => circle.hit,
            _ => None,
        }
    }
}

/// Draw primitives on some surface: SVG, canvas, a test recorder.
pub trait RenderBackend {
    fn create(&mut self, id: &ElementId, primitive: &Primitive);
    fn update(&mut self, id: &ElementId, primitive: &Primitive, transition: Option<Transition>);
    fn remove(&mut self, id: &ElementId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ReconcileStats {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }

    pub fn absorb(&mut self, other: ReconcileStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
    }
}

pub struct RenderEngine<B> {
    backend: B,
    retained: BTreeMap<ElementId, Primitive>,
}

impl<B: RenderBackend> RenderEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retained: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn get(&self, id: &ElementId) -> Option<&Primitive> {
        self.retained.get(id)
    }

    pub fn layer_len(&self, layer: Layer) -> usize {
        self.retained.keys().filter(|id| id.layer == layer).count()
    }

    /// Make `layer` contain exactly `desired`. Keys must be unique per layer;
    /// a repeated key keeps its last primitive.
    pub fn reconcile<I>(&mut self, layer: Layer, desired: I, transition: Option<Transition>) -> ReconcileStats
    where
        I: IntoIterator<Item = (String, Primitive)>,
    {
        let mut stats = ReconcileStats::default();
        let mut seen = BTreeSet::new();
        for (key, primitive) in desired {
            let id = ElementId::new(layer, key);
            stats.absorb(self.put(&id, primitive, transition));
            seen.insert(id);
        }
        let stale: Vec<ElementId> = self
            .retained
            .keys()
            .filter(|id| id.layer == layer && !seen.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            stats.absorb(self.remove(&id));
        }
        stats
    }

    /// Create or update a single element.
    pub fn put(&mut self, id: &ElementId, primitive: Primitive, transition: Option<Transition>) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        match self.retained.get(id) {
            Some(existing) if *existing == primitive => {}
            Some(_) => {
                self.backend.update(id, &primitive, transition);
                self.retained.insert(id.clone(), primitive);
                stats.updated = 1;
            }
            None => {
                self.backend.create(id, &primitive);
                self.retained.insert(id.clone(), primitive);
                stats.created = 1;
            }
        }
        stats
    }

    pub fn remove(&mut self, id: &ElementId) -> ReconcileStats {
        if self.retained.remove(id).is_some() {
            self.backend.remove(id);
            ReconcileStats {
                removed: 1,
                ..Default::default()
            }
        } else {
            ReconcileStats::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Counts backend traffic.
    #[derive(Default, Debug)]
    pub(crate) struct RecordingBackend {
        pub creates: usize,
        pub updates: usize,
        pub removes: usize,
        pub last_transition: Option<Transition>,
        pub live: BTreeMap<ElementId, Primitive>,
    }

    impl RecordingBackend {
        pub fn total(&self) -> usize {
            self.creates + self.updates + self.removes
        }
    }

    impl RenderBackend for RecordingBackend {
        fn create(&mut self, id: &ElementId, primitive: &Primitive) {
            self.creates += 1;
            assert!(self.live.insert(id.clone(), primitive.clone()).is_none(), "duplicate {id:?}");
        }

        fn update(&mut self, id: &ElementId, primitive: &Primitive, transition: Option<Transition>) {
            self.updates += 1;
            self.last_transition = transition;
            assert!(self.live.insert(id.clone(), primitive.clone()).is_some(), "update of missing {id:?}");
        }

        fn remove(&mut self, id: &ElementId) {
            self.removes += 1;
            assert!(self.live.remove(id).is_some(), "remove of missing {id:?}");
        }
    }

    fn dot(cx: f64, fill: &'static str) -> Primitive {
        Primitive::Circle(CircleShape {
            cx,
            cy: 10.0,
            r: 6.0,
            fill,
            stroke: "#ffffff",
            stroke_width: 2.0,
            hit: None,
        })
    }

    #[test]
    fn test_reconcile_create_update_remove() {
        let mut engine = RenderEngine::new(RecordingBackend::default());
        let stats = engine.reconcile(
            Layer::Markers,
            vec![("a".to_string(), dot(1.0, "#ccc")), ("b".to_string(), dot(2.0, "#ccc"))],
            None,
        );
        assert_eq!(stats, ReconcileStats { created: 2, updated: 0, removed: 0 });

        let stats = engine.reconcile(
            Layer::Markers,
            vec![("b".to_string(), dot(5.0, "#ccc")), ("c".to_string(), dot(3.0, "#ccc"))],
            None,
        );
        assert_eq!(stats, ReconcileStats { created: 1, updated: 1, removed: 1 });
        assert_eq!(engine.layer_len(Layer::Markers), 2);
        assert_eq!(engine.backend().live.len(), 2);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut engine = RenderEngine::new(RecordingBackend::default());
        let desired = || vec![("a".to_string(), dot(1.0, "#ccc"))];
        engine.reconcile(Layer::Markers, desired(), None);
        let before = engine.backend().total();
        let stats = engine.reconcile(Layer::Markers, desired(), None);
        assert!(stats.is_noop());
        assert_eq!(engine.backend().total(), before);
    }

    #[test]
    fn test_layers_are_independent() {
        let mut engine = RenderEngine::new(RecordingBackend::default());
        engine.reconcile(Layer::Markers, vec![("a".to_string(), dot(1.0, "#ccc"))], None);
        let stats = engine.reconcile(Layer::Labels, Vec::new(), None);
        assert!(stats.is_noop());
        assert_eq!(engine.layer_len(Layer::Markers), 1);
    }

    #[test]
    fn test_put_reports_transition() {
        let mut engine = RenderEngine::new(RecordingBackend::default());
        let id = ElementId::new(Layer::Markers, "a");
        assert!(engine.remove(&id).is_noop());

        engine.put(&id, dot(1.0, "#ccc"), None);
        let transition = Transition { duration_ms: 200, easing: Easing::CubicInOut };
        let stats = engine.put(&id, dot(1.0, "#4477ff"), Some(transition));
        assert_eq!(stats.updated, 1);
        assert_eq!(engine.backend().last_transition, Some(transition));
        assert!(engine.put(&id, dot(1.0, "#4477ff"), Some(transition)).is_noop());
    }

    #[test]
    fn test_classify_is_inclusive() {
        assert_eq!(VisualState::classify(100, 100.0), VisualState::Past);
        assert_eq!(VisualState::classify(100, 99.0), VisualState::Future);
        assert_eq!(VisualState::classify(100, 99.999), VisualState::Future);
    }
}
