//! Tree navigation state.
//!
//! A [`HistoryHandler`] keeps every page of a tree resident and tracks only the identifier
//! path from a root page down to the page being shown. Transitions replace the path with a new
//! immutable snapshot, so a reader holding an older [`HistoryHandler::path`] never observes a
//! half-applied change.

use log::debug;
use std::fmt;
use std::sync::Arc;

use super::generation::Generation;
use super::option::SelectOption;
use crate::errors::NavigationError;
use crate::logutil::{escape_log, format_path};

/// A node that can appear in a navigable tree.
pub trait Subpages: Sized {
    fn node_option(&self) -> &SelectOption;

    /// Children in display order.
    fn subpages(&self) -> Vec<&Self>;

    /// The child accepted by `matcher` for `id`.
    fn subpage_mut(
        &mut self,
        id: &str,
        matcher: &dyn Fn(&Self, &str) -> bool,
    ) -> Option<&mut Self>;
}

pub type Matcher<P> = Arc<dyn Fn(&P, &str) -> bool + Send + Sync>;
pub type Transformer<P> = Arc<dyn Fn(&P) -> String + Send + Sync>;

#[derive(Clone)]
pub struct HistoryHandler<P> {
    pages: Vec<P>,
    matcher: Matcher<P>,
    transformer: Transformer<P>,
    minimum_depth: usize,
    path: Arc<[String]>,
    generation: Generation,
}

impl<P: fmt::Debug> fmt::Debug for HistoryHandler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryHandler")
            .field("pages", &self.pages)
            .field("minimum_depth", &self.minimum_depth)
            .field("path", &self.path)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Pages and position only; matcher and transformer closures are not compared.
impl<P: PartialEq> PartialEq for HistoryHandler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.pages == other.pages
            && self.minimum_depth == other.minimum_depth
            && self.path == other.path
    }
}

impl<P: Subpages + 'static> HistoryHandler<P> {
    pub fn builder() -> HistoryHandlerBuilder<P> {
        HistoryHandlerBuilder {
            pages: Vec::new(),
            matcher: Arc::new(|page: &P, id: &str| page.node_option().value == id),
            transformer: Arc::new(|page: &P| page.node_option().value.clone()),
            minimum_depth: 1,
        }
    }

    pub fn new(pages: Vec<P>) -> Self {
        Self::builder().with_pages(pages).build()
    }
}

impl<P: Subpages> HistoryHandler<P> {
    pub fn pages(&self) -> &[P] {
        &self.pages
    }

    /// Root page matching `id`.
    pub fn page(&self, id: &str) -> Option<&P> {
        self.pages.iter().find(|p| (self.matcher)(p, id))
    }

    /// Immutable snapshot of the identifier path.
    pub fn path(&self) -> Arc<[String]> {
        Arc::clone(&self.path)
    }

    pub fn identifier_history(&self) -> Vec<String> {
        self.path.to_vec()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn minimum_depth(&self) -> usize {
        self.minimum_depth
    }

    pub fn has_page_history(&self) -> bool {
        self.path.len() > self.minimum_depth
    }

    pub fn identify(&self, page: &P) -> String {
        (self.transformer)(page)
    }

    fn stale(path: &[String], missing: &str) -> NavigationError {
        NavigationError::StaleHistory {
            path: path.to_vec(),
            missing: missing.to_string(),
        }
    }

    fn resolve(&self, path: &[String]) -> Result<&P, NavigationError> {
        let Some((first, rest)) = path.split_first() else {
            return self.pages.first().ok_or(NavigationError::EmptyTree);
        };
        let mut node = self
            .page(first)
            .ok_or_else(|| Self::stale(path, first))?;
        for id in rest {
            node = node
                .subpages()
                .into_iter()
                .find(|child| (self.matcher)(child, id))
                .ok_or_else(|| Self::stale(path, id))?;
        }
        Ok(node)
    }

    fn resolve_mut(&mut self, path: Arc<[String]>) -> Result<&mut P, NavigationError> {
        let matcher = Arc::clone(&self.matcher);
        let Some((first, rest)) = path.split_first() else {
            return self.pages.first_mut().ok_or(NavigationError::EmptyTree);
        };
        let mut node = self
            .pages
            .iter_mut()
            .find(|p| matcher(p, first))
            .ok_or_else(|| Self::stale(&path, first))?;
        for id in rest {
            node = node
                .subpage_mut(id, &*matcher)
                .ok_or_else(|| Self::stale(&path, id))?;
        }
        Ok(node)
    }

    /// The page at the end of the path; the first root page while the path is empty.
    pub fn current_page(&self) -> Result<&P, NavigationError> {
        self.resolve(&self.path)
    }

    pub fn current_page_mut(&mut self) -> Result<&mut P, NavigationError> {
        let path = self.path();
        self.resolve_mut(path)
    }

    /// Like [`current_page`](Self::current_page) but `None` for an empty path.
    pub fn path_page(&self) -> Result<Option<&P>, NavigationError> {
        if self.path.is_empty() {
            return Ok(None);
        }
        self.resolve(&self.path).map(Some)
    }

    pub fn path_page_mut(&mut self) -> Result<Option<&mut P>, NavigationError> {
        if self.path.is_empty() {
            return Ok(None);
        }
        let path = self.path();
        self.resolve_mut(path).map(Some)
    }

    /// The parent of the current page, absent at root depth.
    pub fn previous_page(&self) -> Option<&P> {
        let len = self.path.len();
        if len < 2 {
            return None;
        }
        self.resolve(&self.path[..len - 1]).ok()
    }

    /// Child of the current page matching `id`.
    pub fn sub_page(&self, id: &str) -> Result<Option<&P>, NavigationError> {
        let current = self.current_page()?;
        Ok(current
            .subpages()
            .into_iter()
            .find(|child| (self.matcher)(child, id)))
    }

    fn set_path(&mut self, path: Vec<String>) {
        debug!(
            target: "nav",
            "path {} -> {}",
            format_path(&self.path),
            format_path(&path)
        );
        self.path = path.into();
        self.generation.bump();
    }

    /// Reset the path to `[page]`. `page` must be one of the root pages.
    pub fn goto_page(&mut self, page: &P) -> Result<(), NavigationError> {
        let id = self.identify(page);
        self.goto_top_level_page(&id)
    }

    pub fn goto_top_level_page(&mut self, id: &str) -> Result<(), NavigationError> {
        let page = self
            .page(id)
            .ok_or_else(|| NavigationError::PageNotFound(id.to_string()))?;
        let key = self.identify(page);
        self.set_path(vec![key]);
        Ok(())
    }

    /// Same transition as [`goto_top_level_page`](Self::goto_top_level_page); used when
    /// seeding from a persisted path.
    pub fn locate_page(&mut self, id: &str) -> Result<(), NavigationError> {
        debug!(target: "nav", "locating page {}", escape_log(id));
        self.goto_top_level_page(id)
    }

    /// Descend into the child of the current page matching `id`. On failure the path is
    /// left untouched.
    pub fn goto_sub_page(&mut self, id: &str) -> Result<(), NavigationError> {
        let current = self.current_page()?;
        let child = current
            .subpages()
            .into_iter()
            .find(|child| (self.matcher)(child, id))
            .ok_or_else(|| NavigationError::SubPageNotFound(id.to_string()))?;
        let child_key = self.identify(child);
        let mut next = self.path.to_vec();
        if next.is_empty() {
            next.push(self.identify(current));
        }
        next.push(child_key);
        self.set_path(next);
        Ok(())
    }

    /// Pop one level unless already at the minimum depth. Returns whether the path changed.
    pub fn goto_previous_page(&mut self) -> bool {
        if !self.has_page_history() {
            return false;
        }
        let next = self.path[..self.path.len() - 1].to_vec();
        self.set_path(next);
        true
    }

    /// Fall back to the first root page.
    pub fn goto_root(&mut self) -> Result<(), NavigationError> {
        let first = self.pages.first().ok_or(NavigationError::EmptyTree)?;
        let key = self.identify(first);
        self.set_path(vec![key]);
        Ok(())
    }

    /// Empty the path entirely.
    pub fn clear(&mut self) {
        if !self.path.is_empty() {
            self.set_path(Vec::new());
        }
    }

    /// Replay a persisted path: the first identifier as a top-level page, the rest as
    /// subpages. Applied all-or-nothing.
    pub fn replay<S: AsRef<str>>(&mut self, path: &[S]) -> Result<(), NavigationError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(());
        };
        let first = first.as_ref();
        let mut node = self
            .page(first)
            .ok_or_else(|| NavigationError::PageNotFound(first.to_string()))?;
        let mut next = vec![self.identify(node)];
        for id in rest {
            let id = id.as_ref();
            node = node
                .subpages()
                .into_iter()
                .find(|child| (self.matcher)(child, id))
                .ok_or_else(|| NavigationError::SubPageNotFound(id.to_string()))?;
            next.push(self.identify(node));
        }
        self.set_path(next);
        Ok(())
    }

    /// Swap in a new set of root pages, keeping the current path. The path may no longer
    /// resolve afterwards; [`validate`](Self::validate) reports that as stale history.
    pub fn rebase(&mut self, pages: Vec<P>) {
        self.pages = pages;
        self.generation.bump();
    }

    pub fn validate(&self) -> Result<(), NavigationError> {
        self.current_page().map(|_| ())
    }

    /// Mark the tree changed without moving, e.g. after editing the current page in place.
    pub fn touch(&mut self) {
        self.generation.bump();
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    pub fn is_cache_update_required(&self) -> bool {
        self.generation.is_dirty()
    }

    pub fn set_no_cache_update_required(&mut self) {
        self.generation.commit();
    }
}

pub struct HistoryHandlerBuilder<P> {
    pages: Vec<P>,
    matcher: Matcher<P>,
    transformer: Transformer<P>,
    minimum_depth: usize,
}

impl<P> HistoryHandlerBuilder<P> {
    pub fn with_pages<I: IntoIterator<Item = P>>(mut self, pages: I) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn with_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&P, &str) -> bool + Send + Sync + 'static,
    {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn with_transformer<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&P) -> String + Send + Sync + 'static,
    {
        self.transformer = Arc::new(transformer);
        self
    }

    /// Depth at or below which [`HistoryHandler::goto_previous_page`] stops popping.
    pub fn with_minimum_depth(mut self, depth: usize) -> Self {
        self.minimum_depth = depth;
        self
    }

    pub fn build(self) -> HistoryHandler<P> {
        HistoryHandler {
            pages: self.pages,
            matcher: self.matcher,
            transformer: self.transformer,
            minimum_depth: self.minimum_depth,
            path: Arc::from(Vec::new()),
            generation: Generation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        option: SelectOption,
        children: Vec<Node>,
    }

    fn node(id: &str, children: Vec<Node>) -> Node {
        Node {
            option: SelectOption::new(id, id.to_uppercase()),
            children,
        }
    }

    impl Subpages for Node {
        fn node_option(&self) -> &SelectOption {
            &self.option
        }

        fn subpages(&self) -> Vec<&Self> {
            self.children.iter().collect()
        }

        fn subpage_mut(
            &mut self,
            id: &str,
            matcher: &dyn Fn(&Self, &str) -> bool,
        ) -> Option<&mut Self> {
            self.children.iter_mut().find(|c| matcher(c, id))
        }
    }

    fn tree() -> HistoryHandler<Node> {
        HistoryHandler::new(vec![
            node("a", vec![node("a1", vec![node("a1x", vec![])])]),
            node("b", vec![node("b1", vec![])]),
        ])
    }

    #[test]
    fn empty_path_defaults_to_first_root() {
        let handler = tree();
        assert_eq!(handler.current_page().unwrap().option.value, "a");
        assert_eq!(handler.path_page().unwrap(), None);
        assert!(!handler.has_page_history());
    }

    #[test]
    fn descends_and_pops() {
        let mut handler = tree();
        handler.goto_top_level_page("a").unwrap();
        handler.goto_sub_page("a1").unwrap();
        handler.goto_sub_page("a1x").unwrap();
        assert_eq!(handler.identifier_history(), vec!["a", "a1", "a1x"]);
        assert_eq!(handler.previous_page().unwrap().option.value, "a1");
        assert!(handler.goto_previous_page());
        assert!(handler.goto_previous_page());
        assert!(!handler.goto_previous_page(), "root depth is the floor");
        assert_eq!(handler.identifier_history(), vec!["a"]);
    }

    #[test]
    fn snapshots_are_immutable() {
        let mut handler = tree();
        handler.goto_top_level_page("b").unwrap();
        let before = handler.path();
        handler.goto_sub_page("b1").unwrap();
        assert_eq!(&*before, &["b".to_string()]);
        assert_eq!(handler.depth(), 2);
    }

    #[test]
    fn unknown_targets_fail_without_moving() {
        let mut handler = tree();
        handler.goto_top_level_page("a").unwrap();
        assert_eq!(
            handler.goto_top_level_page("zzz"),
            Err(NavigationError::PageNotFound("zzz".into()))
        );
        assert_eq!(
            handler.goto_sub_page("b1"),
            Err(NavigationError::SubPageNotFound("b1".into()))
        );
        assert_eq!(handler.identifier_history(), vec!["a"]);
    }

    #[test]
    fn replay_is_all_or_nothing() {
        let mut handler = tree();
        handler.goto_top_level_page("b").unwrap();
        assert!(handler.replay(&["a", "a1", "nope"]).is_err());
        assert_eq!(handler.identifier_history(), vec!["b"]);
        handler.replay(&["a", "a1"]).unwrap();
        assert_eq!(handler.identifier_history(), vec!["a", "a1"]);
    }

    #[test]
    fn rebase_can_leave_stale_history() {
        let mut handler = tree();
        handler.replay(&["a", "a1"]).unwrap();
        handler.rebase(vec![node("a", vec![])]);
        match handler.validate() {
            Err(NavigationError::StaleHistory { missing, .. }) => assert_eq!(missing, "a1"),
            other => panic!("expected stale history, got {other:?}"),
        }
        handler.goto_root().unwrap();
        assert!(handler.validate().is_ok());
    }

    #[test]
    fn mutable_resolution_reaches_nested_nodes() {
        let mut handler = tree();
        handler.replay(&["a", "a1"]).unwrap();
        handler.current_page_mut().unwrap().children.clear();
        assert!(handler.current_page().unwrap().children.is_empty());
    }

    #[test]
    fn custom_matcher_and_depth() {
        let mut handler = HistoryHandler::builder()
            .with_pages(vec![node("a", vec![node("a1", vec![])])])
            .with_matcher(|n: &Node, id: &str| n.option.label.eq_ignore_ascii_case(id))
            .with_minimum_depth(0)
            .build();
        handler.goto_top_level_page("A").unwrap();
        handler.goto_sub_page("a1").unwrap();
        assert!(handler.goto_previous_page());
        assert!(handler.goto_previous_page());
        assert_eq!(handler.depth(), 0);
    }

    #[test]
    fn every_transition_marks_dirty() {
        let mut handler = tree();
        handler.goto_root().unwrap();
        handler.set_no_cache_update_required();
        assert!(!handler.is_cache_update_required());
        handler.goto_sub_page("a1").unwrap();
        assert!(handler.is_cache_update_required());
        handler.set_no_cache_update_required();
        handler.goto_previous_page();
        assert!(handler.is_cache_update_required());
    }
}
