use crate::common::collections::HashSet;

/// Modifier state of a selection click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    /// Ctrl/cmd held: accumulate instead of replacing.
    pub multi: bool,
    /// Shift held: extend a range from the anchor.
    pub range: bool,
}

/// Flag changes produced by one selection gesture. Ids absent from both
/// lists keep their current state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionUpdate {
    pub select: Vec<String>,
    pub deselect: Vec<String>,
    pub anchor: Option<String>,
}

/// Resolves a click against the panel's visible row order.
///
/// Range gestures select the inclusive span between the anchor and the
/// clicked row, insensitive to click direction; without the multi modifier
/// everything outside the span is dropped. Plain clicks flip the clicked
/// row and, without modifiers, clear the rest. The anchor always moves to
/// the clicked row so chained shift-clicks extend from the most recent
/// click.
pub fn toggle(
    visible: &[String],
    selected: &HashSet<String>,
    clicked: &str,
    modifiers: ClickModifiers,
    anchor: Option<&str>,
) -> SelectionUpdate {
    if modifiers.range
        && let Some(anchor) = anchor
        && let Some(span) = span(visible, anchor, clicked)
    {
        let deselect = if modifiers.multi {
            Vec::new()
        } else {
            selected.iter().filter(|id| !span.contains(*id)).cloned().collect()
        };
        return SelectionUpdate {
            select: span,
            deselect,
            anchor: Some(clicked.to_string()),
        };
    }

    let mut update = SelectionUpdate {
        anchor: Some(clicked.to_string()),
        ..Default::default()
    };
    if selected.contains(clicked) {
        update.deselect.push(clicked.to_string());
    } else {
        update.select.push(clicked.to_string());
    }
    if !modifiers.multi && !modifiers.range {
        update.deselect.extend(selected.iter().filter(|id| *id != clicked).cloned());
    }
    update
}

/// Inclusive span of visible rows between `a` and `b`, in visible order.
/// `None` when either endpoint is not visible.
fn span(visible: &[String], a: &str, b: &str) -> Option<Vec<String>> {
    let pos_a = visible.iter().position(|id| id == a)?;
    let pos_b = visible.iter().position(|id| id == b)?;
    let (lo, hi) = if pos_a <= pos_b { (pos_a, pos_b) } else { (pos_b, pos_a) };
    Some(visible[lo..=hi].to_vec())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rows(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_click_selects_exclusively() {
        let visible = rows(&["a", "b", "c"]);
        let update = toggle(&visible, &set(&["b", "c"]), "a", ClickModifiers::default(), None);
        assert_eq!(update.select, vec!["a"]);
        let mut dropped = update.deselect.clone();
        dropped.sort();
        assert_eq!(dropped, vec!["b", "c"]);
        assert_eq!(update.anchor.as_deref(), Some("a"));
    }

    #[test]
    fn plain_click_on_selected_row_flips_it_off() {
        let visible = rows(&["a", "b"]);
        let update = toggle(&visible, &set(&["a"]), "a", ClickModifiers::default(), Some("a"));
        assert!(update.select.is_empty());
        assert_eq!(update.deselect, vec!["a"]);
    }

    #[test]
    fn multi_click_accumulates() {
        let visible = rows(&["a", "b", "c"]);
        let update = toggle(
            &visible,
            &set(&["a"]),
            "c",
            ClickModifiers { multi: true, range: false },
            Some("a"),
        );
        assert_eq!(update.select, vec!["c"]);
        assert!(update.deselect.is_empty());
    }

    #[test]
    fn multi_click_toggles_off_without_touching_others() {
        let visible = rows(&["a", "b", "c"]);
        let update = toggle(
            &visible,
            &set(&["a", "c"]),
            "c",
            ClickModifiers { multi: true, range: false },
            Some("a"),
        );
        assert_eq!(update.deselect, vec!["c"]);
        assert!(update.select.is_empty());
    }

    #[test]
    fn range_is_symmetric() {
        let visible = rows(&["a", "b", "c", "d", "e"]);
        let forward = toggle(
            &visible,
            &HashSet::default(),
            "d",
            ClickModifiers { multi: false, range: true },
            Some("b"),
        );
        let backward = toggle(
            &visible,
            &HashSet::default(),
            "b",
            ClickModifiers { multi: false, range: true },
            Some("d"),
        );
        assert_eq!(forward.select, vec!["b", "c", "d"]);
        assert_eq!(backward.select, vec!["b", "c", "d"]);
    }

    #[test]
    fn range_without_multi_drops_outside_rows() {
        let visible = rows(&["a", "b", "c", "d"]);
        let update = toggle(
            &visible,
            &set(&["a", "d"]),
            "c",
            ClickModifiers { multi: false, range: true },
            Some("b"),
        );
        assert_eq!(update.select, vec!["b", "c"]);
        let mut dropped = update.deselect.clone();
        dropped.sort();
        assert_eq!(dropped, vec!["a", "d"]);
    }

    #[test]
    fn range_with_multi_keeps_outside_rows() {
        let visible = rows(&["a", "b", "c", "d"]);
        let update = toggle(
            &visible,
            &set(&["a"]),
            "d",
            ClickModifiers { multi: true, range: true },
            Some("c"),
        );
        assert_eq!(update.select, vec!["c", "d"]);
        assert!(update.deselect.is_empty());
    }

    #[test]
    fn range_anchor_moves_to_clicked_row() {
        let visible = rows(&["a", "b", "c", "d", "e"]);
        let update = toggle(
            &visible,
            &HashSet::default(),
            "c",
            ClickModifiers { multi: false, range: true },
            Some("a"),
        );
        assert_eq!(update.anchor.as_deref(), Some("c"));

        // A chained shift-click now extends from c, not a.
        let chained = toggle(
            &visible,
            &set(&["a", "b", "c"]),
            "e",
            ClickModifiers { multi: false, range: true },
            update.anchor.as_deref(),
        );
        assert_eq!(chained.select, vec!["c", "d", "e"]);
    }

    #[test]
    fn range_with_stale_anchor_falls_back_to_toggle() {
        let visible = rows(&["a", "b"]);
        let update = toggle(
            &visible,
            &HashSet::default(),
            "b",
            ClickModifiers { multi: false, range: true },
            Some("gone"),
        );
        assert_eq!(update.select, vec!["b"]);
    }
}
