use super::component::{MenuKind, PagingButton, BACK_VALUE};

/// A navigation or paging request decoded from an inbound interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    /// Page selector: jump to a root page.
    SelectPage(String),
    /// Subpage selector: descend into a child of the current page.
    SelectSubPage(String),
    /// Subpage selector's synthetic back entry.
    Back,
    PreviousItems,
    NextItems,
    FirstItems,
    LastItems,
    GotoItems(i64),
    NextSorter,
    InvertOrder,
    /// One filled-in input of the search modal.
    Search { input: String, query: String },
    /// Item editor: open a page item or pick an editable item.
    SelectItem(String),
}

impl PageAction {
    /// Decode a paging button. The search and index buttons map to nothing: search opens a
    /// modal and index is a label.
    pub fn from_button(custom_id: &str) -> Option<Self> {
        match PagingButton::from_custom_id(custom_id)? {
            PagingButton::Previous => Some(PageAction::PreviousItems),
            PagingButton::Next => Some(PageAction::NextItems),
            PagingButton::Sort => Some(PageAction::NextSorter),
            PagingButton::Order => Some(PageAction::InvertOrder),
            PagingButton::Index | PagingButton::Search => None,
        }
    }

    pub fn from_selection(custom_id: &str, values: &[String]) -> Option<Self> {
        let value = values.first()?.clone();
        match MenuKind::from_custom_id(custom_id)? {
            MenuKind::PageSelector => Some(PageAction::SelectPage(value)),
            MenuKind::SubPageSelector if value == BACK_VALUE => Some(PageAction::Back),
            MenuKind::SubPageSelector => Some(PageAction::SelectSubPage(value)),
            MenuKind::ItemEditor => Some(PageAction::SelectItem(value)),
            MenuKind::Custom => None,
        }
    }

    /// One search action per non-blank modal input, in submission order.
    pub fn from_modal(inputs: &[(String, String)]) -> Vec<Self> {
        inputs
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(input, query)| PageAction::Search {
                input: input.clone(),
                query: query.clone(),
            })
            .collect()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PageAction::SelectPage(_) => "select_page",
            PageAction::SelectSubPage(_) => "select_subpage",
            PageAction::Back => "back",
            PageAction::PreviousItems => "previous",
            PageAction::NextItems => "next",
            PageAction::FirstItems => "first",
            PageAction::LastItems => "last",
            PageAction::GotoItems(_) => "goto",
            PageAction::NextSorter => "sort",
            PageAction::InvertOrder => "order",
            PageAction::Search { .. } => "search",
            PageAction::SelectItem(_) => "select_item",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn decodes_selectors() {
        assert_eq!(
            PageAction::from_selection("paging:page-selector", &values(&["b"])),
            Some(PageAction::SelectPage("b".into()))
        );
        assert_eq!(
            PageAction::from_selection("paging:subpage-selector", &values(&[BACK_VALUE])),
            Some(PageAction::Back)
        );
        assert_eq!(
            PageAction::from_selection("paging:subpage-selector", &values(&["b1"])),
            Some(PageAction::SelectSubPage("b1".into()))
        );
        assert_eq!(PageAction::from_selection("paging:page-selector", &[]), None);
        assert_eq!(PageAction::from_selection("other", &values(&["x"])), None);
    }

    #[test]
    fn decodes_buttons() {
        assert_eq!(
            PageAction::from_button(PagingButton::Next.custom_id()),
            Some(PageAction::NextItems)
        );
        assert_eq!(PageAction::from_button(PagingButton::Search.custom_id()), None);
        assert_eq!(PageAction::from_button("custom"), None);
    }

    #[test]
    fn modal_skips_blank_inputs() {
        let actions = PageAction::from_modal(&[
            ("search-page".into(), "2".into()),
            ("name".into(), "   ".into()),
        ]);
        assert_eq!(
            actions,
            vec![PageAction::Search {
                input: "search-page".into(),
                query: "2".into()
            }]
        );
    }
}
