//! Rendered page snapshots.
//!
//! Wraps a parsed markup tree with the visibility rules every parser
//! shares: anything marked hidden (the `hidden` attribute, `aria-hidden`,
//! or an inline `display:none` / `visibility:hidden` style) is invisible,
//! and so is everything beneath it.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::time_range::{find_iso_date, parse_iso_date};

/// Elements whose text never counts as page content.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "template", "noscript", "head"];

static LONG_FORM_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})").expect("long date pattern is valid")
});

/// A parsed page snapshot as supplied by the renderer.
pub struct PageSnapshot {
    html: Html,
}

impl PageSnapshot {
    pub fn parse(markup: &str) -> Self {
        PageSnapshot {
            html: Html::parse_document(markup),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Visible elements matching `selector`, in document order.
    pub fn select_visible<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector).filter(|el| !is_hidden(*el))
    }

    /// Every visible text node together with its parent element.
    pub fn visible_text_nodes(&self) -> Vec<(ElementRef<'_>, &str)> {
        self.html
            .tree
            .nodes()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent().and_then(ElementRef::wrap)?;
                if is_hidden(parent) || is_non_content(parent) {
                    return None;
                }
                Some((parent, &**text))
            })
            .collect()
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Hidden by its own attributes, ignoring ancestors.
pub fn is_self_hidden(el: &ElementRef<'_>) -> bool {
    let value = el.value();

    if value.attr("hidden").is_some() {
        return true;
    }

    if value
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }

    value.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

/// Hidden by itself or by any ancestor.
pub fn is_hidden(el: ElementRef<'_>) -> bool {
    is_self_hidden(&el)
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_self_hidden(&ancestor))
}

fn is_non_content(el: ElementRef<'_>) -> bool {
    NON_CONTENT_TAGS.contains(&el.value().name())
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| NON_CONTENT_TAGS.contains(&ancestor.value().name()))
}

/// Text of `el` with hidden subtrees skipped and whitespace collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_visible_text(el, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push(' ');
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if is_self_hidden(&child_el) || NON_CONTENT_TAGS.contains(&child_el.value().name()) {
                continue;
            }
            collect_visible_text(child_el, out);
        }
    }
}

/// The ISO date in a `data-date` attribute, if well formed.
pub fn data_date(el: &ElementRef<'_>) -> Option<NaiveDate> {
    el.value().attr("data-date").and_then(parse_iso_date)
}

/// A date the element states outright: `data-date`, or an accessible
/// label carrying either an ISO date or `August 17, 2025`.
pub fn explicit_date(el: &ElementRef<'_>) -> Option<NaiveDate> {
    data_date(el).or_else(|| el.value().attr("aria-label").and_then(label_date))
}

fn label_date(label: &str) -> Option<NaiveDate> {
    find_iso_date(label).or_else(|| {
        LONG_FORM_DATE.captures_iter(label).find_map(|caps| {
            let text = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
            NaiveDate::parse_from_str(&text, "%B %d %Y").ok()
        })
    })
}
