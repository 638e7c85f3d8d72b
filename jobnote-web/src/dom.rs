use scraper::{Html, Selector};

/// Detach every element matching one of `tags` from the tree.
pub(crate) fn detach_all(doc: &mut Html, tags: &[&str]) {
    let Ok(selector) = Selector::parse(&tags.join(", ")) else {
        return;
    };
    let ids: Vec<_> = doc.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}
