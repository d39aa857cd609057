use dioxus::prelude::*;
use floor_timeline::constants::*;
use floor_timeline::core::model::TimelineModel;

const FILTER_ALL: &str = "all";

/// Every record of a section with a jump link, filterable by kind.
#[component]
pub fn TimestampTable(model: TimelineModel, on_seek: EventHandler<usize>) -> Element {
    let mut filter = use_signal(|| FILTER_ALL.to_string());
    let kinds = model.kinds();
    let selected = filter();
    let rows: Vec<(usize, String, String, String)> = model
        .entries()
        .iter()
        .filter(|entry| selected == FILTER_ALL || entry.kind() == selected)
        .map(|entry| {
            (
                entry.row(),
                entry.time_text().to_string(),
                entry.label(),
                entry.kind().to_string(),
            )
        })
        .collect();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; gap: 8px;",
            div {
                style: "display: flex; align-items: center; gap: 8px;",
                span { style: "font-size: 12px; color: {TEXT_MUTED};", "Event type" }
                select {
                    value: "{selected}",
                    style: "
                        padding: 4px 8px; font-size: 12px;
                        background-color: {BG_SURFACE}; color: {TEXT_PRIMARY};
                        border: 1px solid {BORDER_DEFAULT}; border-radius: 4px;
                        outline: none;
                    ",
                    onchange: move |e| filter.set(e.value()),
                    option { value: "{FILTER_ALL}", "All" }
                    for kind in kinds {
                        option { key: "{kind}", value: "{kind}", "{kind}" }
                    }
                }
            }
            table {
                style: "width: 100%; border-collapse: collapse; font-size: 13px; color: {TEXT_PRIMARY};",
                thead {
                    tr {
                        style: "text-align: left; color: {TEXT_MUTED}; border-bottom: 1px solid {BORDER_DEFAULT};",
                        th { style: "padding: 4px 8px;", "Time" }
                        th { style: "padding: 4px 8px;", "Event" }
                        th { style: "padding: 4px 8px;", "Type" }
                    }
                }
                tbody {
                    for (row, time, label, kind) in rows {
                        tr {
                            key: "{row}",
                            style: "border-bottom: 1px solid {BORDER_SUBTLE};",
                            td {
                                style: "padding: 4px 8px;",
                                a {
                                    href: "#",
                                    style: "color: {BORDER_ACCENT}; text-decoration: none; font-family: 'SF Mono', Consolas, monospace;",
                                    onclick: move |e| {
                                        e.prevent_default();
                                        on_seek.call(row);
                                    },
                                    "{time}"
                                }
                            }
                            td { style: "padding: 4px 8px;", "{label}" }
                            td { style: "padding: 4px 8px; color: {TEXT_MUTED};", "{kind}" }
                        }
                    }
                }
            }
        }
    }
}
