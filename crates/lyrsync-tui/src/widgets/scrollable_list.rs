//! Generic scrollable list with cursor tracking.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        self.scroll_offset = self.scroll_offset.min(self.selected);
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Scroll so the cursor is within the `height`-row window.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// Returns (index, &item) pairs visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> impl Iterator<Item = (usize, &T)> {
        let end = (self.scroll_offset + height).min(self.items.len());
        let start = self.scroll_offset.min(end);
        self.items[start..end]
            .iter()
            .enumerate()
            .map(move |(i, item)| (start + i, item))
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut list = ScrollableList::new();
        list.set_items(vec![1, 2, 3]);
        list.select_down(10);
        assert_eq!(list.selected, 2);
        list.select_up(10);
        assert_eq!(list.selected, 0);
        list.select_last();
        list.set_items(vec![1]);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_ensure_visible_scrolls_window() {
        let mut list = ScrollableList::new();
        list.set_items((0..20).collect());
        list.select_down(12);
        list.ensure_visible(5);
        assert_eq!(list.scroll_offset, 8);
        let visible: Vec<usize> = list.visible_items(5).map(|(i, _)| i).collect();
        assert_eq!(visible, vec![8, 9, 10, 11, 12]);
        list.select_up(12);
        list.ensure_visible(5);
        assert_eq!(list.scroll_offset, 0);
    }
}
