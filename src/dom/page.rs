//! Skeleton of the measure-explorer dashboard page.
//!
//! Mirrors the markup the server renders: chrome (sidebar, theme toggle,
//! help button, notification container, clock), the measure-detail card with
//! its four tabs, and any number of metric counters.
use super::{Display, Dom, MemoryDom, classes, ids};
use crate::ai::ArtifactKind;
use crate::tabs::Panel;

/// Text shown in the original-expression display before a measure is chosen.
pub const NO_MEASURE_TEXT: &str = "Select a measure to view its definition";

/// Build the dashboard document.
///
/// `metrics` lists `(element id, data-value)` pairs for the metric counters.
pub fn dashboard(metrics: &[(&str, &str)]) -> MemoryDom {
    let mut dom = MemoryDom::new();

    dom.insert(ids::BODY, &[]);
    dom.insert(ids::SIDEBAR, &[]);
    dom.insert(ids::SIDEBAR_TOGGLE, &[]);
    dom.insert(ids::THEME_TOGGLE, &[]);
    dom.insert(ids::HELP_BUTTON, &[]);
    dom.insert(ids::NOTIFICATION_CONTAINER, &[]);
    dom.insert(ids::DATETIME, &[]);

    dom.insert_text(ids::MEASURE_NAME, &[], "");
    dom.insert_text(ids::ORIGINAL_CODE, &[], NO_MEASURE_TEXT);
    dom.insert_text(ids::EXPANDED_CODE, &[], NO_MEASURE_TEXT);

    for panel in Panel::ALL {
        dom.insert(panel.tab_id(), &[classes::MEASURE_TAB]);
        dom.insert(panel.content_id(), &[classes::TAB_CONTENT]);
    }
    dom.add_class(Panel::Original.tab_id(), classes::ACTIVE);
    dom.add_class(Panel::Original.content_id(), classes::ACTIVE);

    for kind in ArtifactKind::ALL {
        dom.insert(kind.loading_id(), &[]);
        dom.set_display(kind.loading_id(), Display::None);
        dom.insert(kind.content_id(), &[]);
        kind.write_placeholder(&mut dom);
    }

    for (id, value) in metrics {
        dom.insert(id, &[classes::METRIC_VALUE]);
        dom.set_attr(id, "data-value", value);
        dom.set_text(id, "0");
    }

    dom
}
