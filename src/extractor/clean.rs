//! DOM pre-processing and visible-text helpers shared by every strategy.

use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};

/// Detach every element matching any of `selectors` from the tree.
///
/// Returns how many elements were removed. Nested matches inside an already
/// detached subtree are detached again harmlessly.
pub fn strip_non_content(document: &mut Html, selectors: &[Selector]) -> usize {
    let mut removed = 0;
    for selector in selectors {
        let ids = document.select(selector).map(|el| el.id()).collect::<Vec<_>>();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
                removed += 1;
            }
        }
    }
    removed
}

fn is_hidden_container(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "script" | "style" | "noscript")
}

/// Words of the human-visible text under `element`.
///
/// Text inside `<script>` (including surviving JSON-LD blocks), `<style>` and
/// `<noscript>` is skipped. Adjacent text nodes are treated as separate words.
pub fn visible_words<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(is_hidden_container);
            (!hidden).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
}

/// Visible text under `element`, whitespace-collapsed.
pub fn visible_text(element: ElementRef<'_>) -> String {
    visible_words(element).join(" ")
}

/// Number of visible words under `element`, without building the text.
pub fn visible_word_count(element: ElementRef<'_>) -> usize {
    visible_words(element).count()
}

/// Number of `<p>` elements that are direct children of `element`.
pub fn direct_paragraph_count(element: ElementRef<'_>) -> usize {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .count()
}
