use shared::domain::Titled;

/// Items whose title contains `term`, ignoring case, in their original order.
///
/// Only the title is searched and matching is plain substring containment.
/// An empty term matches everything.
pub fn filter<T: Titled + Clone>(items: &[T], term: &str) -> Vec<T> {
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| item.title().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
