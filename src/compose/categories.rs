use crate::model::Category;

/// A category as shown in one draft: a private copy of the canonical record
/// plus this draft's selection flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub category: Category,
    pub selected: bool,
}

/// Per-draft category selection, projected from the shared category list.
///
/// Built by value-copying the canonical records so toggling never touches the
/// cached list other drafts read from. Records are addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    choices: Vec<CategoryChoice>,
}

impl CategorySelection {
    /// Project `categories` with nothing selected, keeping fetch order.
    pub fn from_canonical(categories: &[Category]) -> Self {
        Self {
            choices: categories
                .iter()
                .map(|category| CategoryChoice {
                    category: category.clone(),
                    selected: false,
                })
                .collect(),
        }
    }

    /// Flip the flag on category `id`. Returns the new state, or `None` if
    /// no such category was loaded.
    pub fn toggle(&mut self, id: i64) -> Option<bool> {
        let choice = self.choice_mut(id)?;
        choice.selected = !choice.selected;
        Some(choice.selected)
    }

    /// Set the flag on category `id`. Returns false if it is unknown.
    pub fn set(&mut self, id: i64, selected: bool) -> bool {
        match self.choice_mut(id) {
            Some(choice) => {
                choice.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.choices
            .iter()
            .any(|c| c.category.id == id && c.selected)
    }

    /// Ids of selected categories, in fetch order.
    pub fn selected_ids(&self) -> Vec<i64> {
        self.choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.category.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryChoice> {
        self.choices.iter()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    fn choice_mut(&mut self, id: i64) -> Option<&mut CategoryChoice> {
        self.choices.iter_mut().find(|c| c.category.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(ids: &[i64]) -> Vec<Category> {
        ids.iter()
            .map(|&id| Category {
                id,
                name: format!("Category {id}"),
            })
            .collect()
    }

    #[test]
    fn test_starts_unselected() {
        let selection = CategorySelection::from_canonical(&categories(&[1, 2, 3]));
        assert_eq!(selection.len(), 3);
        assert!(selection.iter().all(|c| !c.selected));
        assert!(selection.selected_ids().is_empty());
    }

    #[test]
    fn test_selected_ids_keep_fetch_order() {
        let mut selection = CategorySelection::from_canonical(&categories(&[1, 2, 3]));
        // toggled out of order
        selection.toggle(3);
        selection.toggle(2);
        assert_eq!(selection.selected_ids(), vec![2, 3]);
    }

    #[test]
    fn test_toggle_twice_deselects() {
        let mut selection = CategorySelection::from_canonical(&categories(&[1, 2]));
        assert_eq!(selection.toggle(1), Some(true));
        assert_eq!(selection.toggle(1), Some(false));
        assert!(!selection.is_selected(1));
    }

    #[test]
    fn test_unknown_id() {
        let mut selection = CategorySelection::from_canonical(&categories(&[1]));
        assert_eq!(selection.toggle(99), None);
        assert!(!selection.set(99, true));
    }

    #[test]
    fn test_canonical_list_untouched() {
        let canonical = categories(&[10, 20]);
        let mut selection = CategorySelection::from_canonical(&canonical);
        selection.set(10, true);

        assert_eq!(canonical, categories(&[10, 20]));
        let other = CategorySelection::from_canonical(&canonical);
        assert!(!other.is_selected(10));
    }
}
