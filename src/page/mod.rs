//! Live page driving via headless Chrome.
//!
//! The product page replaces the rendered review list in place when the
//! user paginates, and signals the transition by animating the opacity of
//! a wrapper element. This module owns everything that touches that page:
//!
//! - [`ReviewPage`]: chromiumoxide-backed handle (visibility probe, opacity
//!   read, container snapshot, badge injection, next-page click)
//! - [`PaginationTracker`]: the pure state machine over opacity samples
//! - [`PageSession`]: per-page-view state with the generation counter
//! - [`badge`]: badge states and the injected markup

pub mod badge;
pub mod chrome;
pub mod session;
pub mod tracker;

pub use badge::BadgeState;
pub use chrome::ReviewPage;
pub use session::PageSession;
pub use tracker::{PaginationTracker, TrackerEvent, TrackerState};

use async_trait::async_trait;

use crate::app::Result;

/// Everything the watcher needs from the live page.
///
/// [`ReviewPage`] is the Chrome-backed implementation; tests substitute a
/// scripted one, same as with [`crate::classifier::Classifier`].
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Block until the review container is rendered and intersects the
    /// viewport.
    async fn wait_until_visible(&self) -> Result<()>;

    /// Current opacity of the pagination wrapper.
    async fn wrapper_opacity(&self) -> Result<f64>;

    /// Outer HTML of the review container, as harvest input.
    async fn container_html(&self) -> Result<String>;

    /// Whether every rendered review item already carries a finalized
    /// badge. Items are the container children bearing `item_class` when
    /// one is known, so foreign children (injected banners) don't count.
    async fn all_items_badged(&self, item_class: Option<&str>) -> Result<bool>;

    /// Insert or update the badge for one review index. The index
    /// addresses the item-class-bearing children only, matching how the
    /// harvester assigned it.
    async fn render_badge(&self, item_class: Option<&str>, index: u32, state: &BadgeState)
        -> Result<()>;

    /// Click the next-page control. Returns false when the control is
    /// absent.
    async fn click_next(&self) -> Result<bool>;
}
