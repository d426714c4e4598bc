//! One image slot on a page.
//!
//! An [`ImageView`] renders its stored path through a [`DisplayResolver`]
//! and falls back to its category placeholder. Degradation is one-way: once
//! a path fails to load, the view shows the placeholder whenever it points at
//! that path again and never asks for its URL for the rest of its life.

use super::cache::UrlCache;
use super::placeholder::{Category, placeholder_data_url, placeholder_svg};
use super::resolver::{DisplayResolver, Resolution};
use crate::types::StoredPath;
use maud::{Markup, html};
use std::collections::HashSet;
use thiserror::Error;

/// A resolved URL could not be fetched or decoded. Handled by the view,
/// never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("Failed to display {path}: {reason}")]
    DisplayResolutionFailed { path: StoredPath, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
    Image { url: String, alt: String },
    Placeholder { svg: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    category: Category,
    alt: String,
    label: Option<String>,
    path: StoredPath,
    failed: HashSet<StoredPath>,
}

impl ImageView {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            alt: category.style().label.to_string(),
            label: None,
            path: StoredPath::default(),
            failed: HashSet::new(),
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    /// Text drawn on the placeholder.
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_path(mut self, path: StoredPath) -> Self {
        self.set_path(path);
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn path(&self) -> &StoredPath {
        &self.path
    }

    /// Whether the current path has failed to load before.
    pub fn has_failed(&self) -> bool {
        self.failed.contains(&self.path)
    }

    /// Point the view at another image. Paths that failed earlier stay
    /// failed.
    pub fn set_path(&mut self, path: StoredPath) {
        self.path = path;
    }

    /// The URL for `error`'s path failed to load; that path shows the
    /// placeholder from now on. A late error for a path the view has moved
    /// away from leaves the current image alone.
    pub fn on_error(&mut self, error: DisplayError) {
        let DisplayError::DisplayResolutionFailed { path, .. } = &error;
        if self.failed.insert(path.clone()) {
            tracing::warn!("{}, showing placeholder", error);
        }
    }

    pub fn render<C: UrlCache>(&self, resolver: &DisplayResolver<C>) -> Rendering {
        if self.has_failed() {
            resolver.record_fallback();
            return self.placeholder();
        }
        match resolver.resolve(&self.path) {
            Resolution::Url(url) => Rendering::Image {
                url,
                alt: self.alt.clone(),
            },
            Resolution::Placeholder => self.placeholder(),
        }
    }

    /// Markup for the slot: an `<img>` for a URL, the placeholder as a
    /// `data:` image otherwise.
    pub fn to_html<C: UrlCache>(&self, resolver: &DisplayResolver<C>) -> Markup {
        match self.render(resolver) {
            Rendering::Image { url, alt } => html! {
                img src=(url) alt=(alt) loading="lazy" data-category=(self.category.as_str());
            },
            Rendering::Placeholder { .. } => html! {
                img.placeholder src=(placeholder_data_url(self.category, self.label.as_deref()))
                    alt=(self.alt) data-category=(self.category.as_str());
            },
        }
    }

    fn placeholder(&self) -> Rendering {
        Rendering::Placeholder {
            svg: placeholder_svg(self.category, self.label.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryUrlCache;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_resolver() -> (Rc<Cell<u32>>, DisplayResolver<MemoryUrlCache>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let resolver = DisplayResolver::new(MemoryUrlCache::new(), move |p: &StoredPath| {
            counter.set(counter.get() + 1);
            format!("https://cdn.test/{p}")
        })
        .with_sentinels(vec!["placeholder://".into()]);
        (calls, resolver)
    }

    fn failure(path: &str) -> DisplayError {
        DisplayError::DisplayResolutionFailed {
            path: StoredPath::new(path),
            reason: "404".into(),
        }
    }

    #[test]
    fn renders_resolved_image() {
        let (_, resolver) = counting_resolver();
        let view = ImageView::new(Category::News)
            .with_alt("Headline photo")
            .with_path(StoredPath::new("news/a.jpg"));
        assert_eq!(
            view.render(&resolver),
            Rendering::Image {
                url: "https://cdn.test/news/a.jpg".into(),
                alt: "Headline photo".into()
            }
        );
    }

    #[test]
    fn empty_path_renders_placeholder_without_rule() {
        let (calls, resolver) = counting_resolver();
        let view = ImageView::new(Category::Event);
        assert!(matches!(view.render(&resolver), Rendering::Placeholder { .. }));

        let sentinel = ImageView::new(Category::Event).with_path(StoredPath::new("placeholder://x"));
        assert!(matches!(sentinel.render(&resolver), Rendering::Placeholder { .. }));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn failure_is_one_way_for_same_path() {
        let (calls, resolver) = counting_resolver();
        let mut view = ImageView::new(Category::Member).with_path(StoredPath::new("member/a.jpg"));
        assert!(matches!(view.render(&resolver), Rendering::Image { .. }));

        view.on_error(failure("member/a.jpg"));
        view.set_path(StoredPath::new("member/a.jpg"));
        for _ in 0..3 {
            assert!(matches!(view.render(&resolver), Rendering::Placeholder { .. }));
        }
        assert!(view.has_failed());
        assert_eq!(calls.get(), 1);
        assert_eq!(resolver.stats().hits, 0);
        assert_eq!(resolver.stats().placeholders, 3);
    }

    #[test]
    fn new_path_gets_fresh_attempt() {
        let (_, resolver) = counting_resolver();
        let mut view = ImageView::new(Category::Member).with_path(StoredPath::new("member/a.jpg"));
        view.on_error(failure("member/a.jpg"));

        view.set_path(StoredPath::new("member/b.jpg"));
        assert!(!view.has_failed());
        assert_eq!(
            view.render(&resolver),
            Rendering::Image {
                url: "https://cdn.test/member/b.jpg".into(),
                alt: "Member".into()
            }
        );
    }

    #[test]
    fn returning_to_failed_path_keeps_placeholder() {
        let (calls, resolver) = counting_resolver();
        let mut view = ImageView::new(Category::Member).with_path(StoredPath::new("member/a.jpg"));
        assert!(matches!(view.render(&resolver), Rendering::Image { .. }));
        view.on_error(failure("member/a.jpg"));

        view.set_path(StoredPath::new("member/b.jpg"));
        assert!(matches!(view.render(&resolver), Rendering::Image { .. }));

        view.set_path(StoredPath::new("member/a.jpg"));
        assert!(view.has_failed());
        assert!(matches!(view.render(&resolver), Rendering::Placeholder { .. }));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn late_error_for_previous_path_leaves_current_image() {
        let (_, resolver) = counting_resolver();
        let mut view = ImageView::new(Category::Member).with_path(StoredPath::new("member/a.jpg"));
        view.set_path(StoredPath::new("member/b.jpg"));
        view.on_error(failure("member/a.jpg"));

        assert!(!view.has_failed());
        assert_eq!(
            view.render(&resolver),
            Rendering::Image {
                url: "https://cdn.test/member/b.jpg".into(),
                alt: "Member".into()
            }
        );
    }

    #[test]
    fn placeholder_uses_label() {
        let (_, resolver) = counting_resolver();
        let view = ImageView::new(Category::Game).with_label(Some("Add box art".into()));
        match view.render(&resolver) {
            Rendering::Placeholder { svg } => assert!(svg.contains("Add box art")),
            other => panic!("expected placeholder, got {other:?}"),
        }
    }

    #[test]
    fn html_for_image_and_placeholder() {
        let (_, resolver) = counting_resolver();
        let view = ImageView::new(Category::News).with_path(StoredPath::new("news/a.jpg"));
        let html = view.to_html(&resolver).into_string();
        assert_eq!(
            html,
            r#"<img src="https://cdn.test/news/a.jpg" alt="News" loading="lazy" data-category="news">"#
        );

        let empty = ImageView::new(Category::News).to_html(&resolver).into_string();
        assert!(empty.starts_with(r#"<img class="placeholder" src="data:image/svg+xml;base64,"#));
    }
}
