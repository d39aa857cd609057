use dioxus::prelude::*;

use floor_timeline::constants::{
    BG_SURFACE, BORDER_DEFAULT, TEXT_PRIMARY, TIMELINE_MARGIN_LEFT, TIMELINE_MARGIN_TOP,
    TIMELINE_OUTER_HEIGHT,
};
use floor_timeline::core::interaction::PointerPosition;
use floor_timeline::core::render::{ElementId, HitTarget, Primitive, Transition};
use floor_timeline::core::scene::{Scene, SceneElement};
use floor_timeline::core::session::TimelineCommand;

/// Draws a published [`Scene`] as SVG. Pointer input is caught by one HTML
/// layer over the drawing, hit-tested against the scene and turned back into
/// [`TimelineCommand`]s.
#[component]
pub fn TimelineView(
    scene: Scene,
    outer_width: f64,
    on_command: EventHandler<TimelineCommand>,
) -> Element {
    let mut hovered = use_signal(|| None::<HitTarget>);

    let mut shapes: Vec<(ElementId, SceneElement)> = Vec::with_capacity(scene.len());
    let mut overlays: Vec<(ElementId, SceneElement)> = Vec::new();
    for (id, element) in scene.iter() {
        match element.primitive {
            Primitive::Overlay(_) => overlays.push((id.clone(), element.clone())),
            _ => shapes.push((id.clone(), element.clone())),
        }
    }

    let click = {
        let scene = scene.clone();
        move |e: MouseEvent| {
            let pointer = container_point(&e);
            let (x, y) = plot_point(pointer);
            match scene.hit_test(x, y) {
                Some(HitTarget::Axis) => on_command.call(TimelineCommand::ClickAxis { x }),
                Some(HitTarget::Marker(key)) => on_command.call(TimelineCommand::ClickMarker(key)),
                None => {}
            }
        }
    };
    let hover = move |e: MouseEvent| {
        let pointer = container_point(&e);
        let (x, y) = plot_point(pointer);
        let hit = scene.hit_test(x, y);
        let previous = hovered();
        if previous.is_some() && previous != hit {
            on_command.call(TimelineCommand::PointerOut);
        }
        match hit {
            Some(HitTarget::Axis) => on_command.call(TimelineCommand::HoverAxis { x, pointer }),
            Some(HitTarget::Marker(key)) => {
                on_command.call(TimelineCommand::HoverMarker { key, pointer })
            }
            None => {}
        }
        if previous != hit {
            hovered.set(hit);
        }
    };
    let leave = move |_: MouseEvent| {
        if hovered().is_some() {
            on_command.call(TimelineCommand::PointerOut);
            hovered.set(None);
        }
    };
    let cursor = if hovered().is_some() { "pointer" } else { "default" };

    rsx! {
        div {
            style: "position: relative; width: {outer_width}px; height: {TIMELINE_OUTER_HEIGHT}px;",
            svg {
                width: "{outer_width}",
                height: "{TIMELINE_OUTER_HEIGHT}",
                style: "overflow: visible; pointer-events: none;",
                g {
                    transform: "translate({TIMELINE_MARGIN_LEFT},{TIMELINE_MARGIN_TOP})",
                    for (id, element) in shapes {
                        {render_shape(id, element)}
                    }
                }
            }
            div {
                style: "position: absolute; left: 0; top: 0; width: 100%; height: 100%; cursor: {cursor};",
                onclick: click,
                onmousemove: hover,
                onmouseleave: leave,
            }
            for (id, element) in overlays {
                {render_overlay(id, element)}
            }
        }
    }
}

fn transition_style(transition: Option<Transition>) -> String {
    match transition {
        Some(transition) => format!(
            "transition: all {}ms {};",
            transition.duration_ms,
            transition.easing.css()
        ),
        None => String::new(),
    }
}

/// Pointer position relative to the timeline container. The event target is
/// the childless overlay div that spans the container.
fn container_point(e: &MouseEvent) -> PointerPosition {
    let offset = e.element_coordinates();
    PointerPosition::new(offset.x, offset.y)
}

/// Container position to plot coordinates, inside the margins.
fn plot_point(pointer: PointerPosition) -> (f64, f64) {
    (
        pointer.x - TIMELINE_MARGIN_LEFT,
        pointer.y - TIMELINE_MARGIN_TOP,
    )
}

fn render_shape(id: ElementId, element: SceneElement) -> Element {
    let key = format!("{:?}-{}", id.layer, id.key);
    let style = transition_style(element.transition);

    match element.primitive {
        Primitive::Line(line) => rsx! {
            line {
                key: "{key}",
                x1: "{line.x1}",
                y1: "{line.y1}",
                x2: "{line.x2}",
                y2: "{line.y2}",
                stroke: "{line.stroke}",
                stroke_width: "{line.stroke_width}",
                style: "{style}",
            }
        },
        Primitive::Rect(rect) => rsx! {
            rect {
                key: "{key}",
                x: "{rect.x}",
                y: "{rect.y}",
                width: "{rect.width}",
                height: "{rect.height}",
                fill: "{rect.fill}",
                opacity: "{rect.opacity}",
                style: "{style}",
            }
        },
        Primitive::Circle(circle) => rsx! {
            circle {
                key: "{key}",
                cx: "{circle.cx}",
                cy: "{circle.cy}",
                r: "{circle.r}",
                fill: "{circle.fill}",
                stroke: "{circle.stroke}",
                stroke_width: "{circle.stroke_width}",
                style: "{style}",
            }
        },
        Primitive::Text(text) => rsx! {
            text {
                key: "{key}",
                x: "{text.x}",
                y: "{text.y}",
                text_anchor: "middle",
                font_size: "{text.font_size}px",
                fill: "{text.fill}",
                style: "{style} user-select: none;",
                "{text.text}"
            }
        },
        Primitive::Overlay(_) => rsx! {},
    }
}

fn render_overlay(id: ElementId, element: SceneElement) -> Element {
    let Primitive::Overlay(overlay) = element.primitive else {
        return rsx! {};
    };
    rsx! {
        div {
            key: "{id.key}",
            style: "
                position: absolute;
                left: {overlay.x}px;
                top: {overlay.y}px;
                padding: 6px 8px;
                background-color: {BG_SURFACE};
                border: 1px solid {BORDER_DEFAULT};
                border-radius: 4px;
                box-shadow: 0 1px 3px rgba(0, 0, 0, 0.12);
                color: {TEXT_PRIMARY};
                font-size: 12px;
                white-space: nowrap;
                pointer-events: none;
                z-index: 10;
            ",
            for line in overlay.lines {
                div { "{line}" }
            }
        }
    }
}
