use std::collections::BTreeSet;

use super::record::RecordId;

/// Set of selected record ids.
///
/// The selection is not tied to the rows currently shown. Ids of rows that got
/// filtered out or paged away stay selected until `clear` is called.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RecordId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present.
    pub fn toggle_row(&mut self, id: &RecordId) {
        if !self.ids.remove(id) {
            self.ids.insert(id.clone());
        }
    }

    /// Replace the selection with exactly the ids on the visible page.
    pub fn select_all_visible<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a RecordId>) {
        self.ids = page_ids.into_iter().cloned().collect();
    }

    /// Add the ids on the visible page to the selection.
    pub fn add_visible<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a RecordId>) {
        self.ids.extend(page_ids.into_iter().cloned());
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// State of a "select all" checkbox: the page is non-empty and fully selected.
    pub fn all_visible_selected<'a>(
        &self,
        page_ids: impl IntoIterator<Item = &'a RecordId>,
    ) -> bool {
        let mut any = false;
        for id in page_ids {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: &[i64]) -> Vec<RecordId> {
        n.iter().map(|&i| RecordId::Number(i)).collect()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut s = Selection::new();
        let id = RecordId::Number(1);
        s.toggle_row(&id);
        assert!(s.contains(&id));
        s.toggle_row(&id);
        assert!(s.is_empty());
    }

    #[test]
    fn select_all_visible_replaces() {
        let mut s = Selection::new();
        s.toggle_row(&RecordId::Number(9));
        s.select_all_visible(&ids(&[1, 2]));
        assert_eq!(s.iter().cloned().collect::<Vec<_>>(), ids(&[1, 2]));
    }

    #[test]
    fn add_visible_unions() {
        let mut s = Selection::new();
        s.select_all_visible(&ids(&[1, 2]));
        s.add_visible(&ids(&[3, 4]));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn all_visible_selected_needs_a_non_empty_page() {
        let mut s = Selection::new();
        assert!(!s.all_visible_selected(&ids(&[])));
        s.select_all_visible(&ids(&[1, 2]));
        assert!(s.all_visible_selected(&ids(&[1, 2])));
        assert!(!s.all_visible_selected(&ids(&[2, 3])));
    }
}
