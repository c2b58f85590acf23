//! The harvest/classify/annotate orchestration loop.
//!
//! One cycle: snapshot the container, harvest it, paint loading badges,
//! submit, paint verdicts. The loop around it is driven by the visibility
//! gate (once) and then by the pagination tracker; a duplicate-submission
//! guard keeps at most one cycle in flight per stable page state, and the
//! session's generation counter makes a response that outlived its page
//! detectable so it is dropped instead of overwriting newer badges.
//!
//! A failed cycle never stops the loop; the error is logged and the
//! tracker re-arms for the next pagination.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::{FrauditorError, Result};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::domain::{ClassificationResult, ReviewBatch};
use crate::extract::{self, Markers};
use crate::page::{BadgeState, PageDriver, PageSession, PaginationTracker, TrackerEvent};

pub struct ReviewWatcher {
    page: Box<dyn PageDriver>,
    classifier: Arc<dyn Classifier>,
    config: Config,
    markers: Markers,
    session: PageSession,
    tracker: PaginationTracker,
}

impl ReviewWatcher {
    pub fn new(page: Box<dyn PageDriver>, classifier: Arc<dyn Classifier>, config: Config) -> Self {
        let markers = config.page.markers();
        Self {
            page,
            classifier,
            config,
            markers,
            session: PageSession::new(),
            tracker: PaginationTracker::new(),
        }
    }

    /// Watch the page until cancelled: gate on visibility, badge the first
    /// page of reviews, then re-badge after every pagination settle.
    pub async fn run(&mut self) -> Result<()> {
        self.page.wait_until_visible().await?;
        info!("Review container visible, starting first harvest");
        self.tracker.arm();

        if let Err(e) = self.cycle().await {
            warn!("Initial harvest cycle failed: {}", e);
        }

        loop {
            tokio::time::sleep(self.config.page.poll_interval()).await;

            let opacity = match self.page.wrapper_opacity().await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Opacity poll failed: {}", e);
                    continue;
                }
            };

            match self.tracker.observe_opacity(opacity) {
                Some(TrackerEvent::PaginationStarted) => {
                    debug!("Pagination transition started (opacity {})", opacity);
                }
                Some(TrackerEvent::Resubmit) => {
                    // Let the host page finish swapping the DOM in.
                    tokio::time::sleep(self.config.page.settle_delay()).await;
                    self.session.reset_for_pagination();
                    info!(
                        "Pagination settled, re-harvesting (generation {})",
                        self.session.generation()
                    );
                    if let Err(e) = self.cycle().await {
                        warn!("Harvest cycle failed: {}", e);
                    }
                    self.tracker.rearm();
                }
                None => {}
            }
        }
    }

    /// One harvest → submit → annotate pass over the rendered reviews.
    async fn cycle(&mut self) -> Result<()> {
        if !self.session.begin_submission() {
            debug!("Submission already in flight, skipping cycle");
            return Ok(());
        }
        let outcome = self.cycle_inner().await;
        self.session.finish_submission();
        outcome
    }

    async fn cycle_inner(&mut self) -> Result<()> {
        // A re-entrant trigger without a real page swap leaves the old
        // badges in the DOM; a real pagination replaces the items and
        // loses them. Badge presence is the discriminator.
        if self.page.all_items_badged(self.session.item_class()).await? {
            debug!("All rendered items already badged, suppressing re-submission");
            return Ok(());
        }

        let html = self.page.container_html().await?;
        let (batch, item_class) =
            extract::harvest_snapshot(&html, &self.markers, self.session.generation())?;
        self.session.set_item_class(item_class);

        if batch.is_empty() {
            debug!("Nothing harvested from container");
            return Ok(());
        }
        info!("Harvested {} reviews", batch.len());

        for index in batch.indices() {
            self.page
                .render_badge(self.session.item_class(), index, &BadgeState::Loading)
                .await?;
        }

        let generation = batch.generation();
        match self.classifier.classify(&batch).await {
            Ok(results) => {
                if !self.session.accepts(generation) {
                    warn!(
                        "Dropping classification response for stale generation {}",
                        generation
                    );
                    return Ok(());
                }
                self.annotate(&batch, results).await
            }
            Err(e) => {
                warn!("Classification failed: {}", e);
                if self.session.accepts(generation) {
                    for index in batch.indices() {
                        self.page
                            .render_badge(self.session.item_class(), index, &BadgeState::Error)
                            .await?;
                    }
                }
                Err(e)
            }
        }
    }

    async fn annotate(
        &mut self,
        batch: &ReviewBatch,
        results: BTreeMap<u32, ClassificationResult>,
    ) -> Result<()> {
        let (verdicts, dropped) = correlate(batch, results);
        if dropped > 0 {
            warn!("Dropped {} predictions for unharvested indices", dropped);
        }

        for (index, result) in verdicts {
            self.page
                .render_badge(self.session.item_class(), index, &BadgeState::Verdict(result))
                .await?;
            self.session.mark_processed(index);
        }

        // Harvested items the classifier stayed silent on must not be left
        // spinning.
        for index in batch.indices() {
            if !self.session.is_processed(index) {
                self.page
                    .render_badge(self.session.item_class(), index, &BadgeState::Error)
                    .await?;
                self.session.mark_processed(index);
            }
        }

        Ok(())
    }

    /// Collect reviews across up to `pages` pages by clicking the next-page
    /// control on a fixed delay, merging into one running batch. Capped by
    /// config regardless of the argument.
    pub async fn crawl(&mut self, pages: u32) -> Result<ReviewBatch> {
        self.page.wait_until_visible().await?;

        let cap = pages.max(1).min(self.config.crawl.max_pages.max(1));
        let mut merged = ReviewBatch::new(self.session.generation());

        for page_no in 1..=cap {
            let html = self.page.container_html().await?;
            let (batch, item_class) =
                extract::harvest_snapshot(&html, &self.markers, self.session.generation())?;
            self.session.set_item_class(item_class);
            info!("Page {}: harvested {} reviews", page_no, batch.len());
            merged.merge(batch);

            if page_no == cap {
                break;
            }
            if !self.page.click_next().await? {
                debug!("No next-page control, stopping crawl");
                break;
            }
            tokio::time::sleep(self.config.crawl.page_delay()).await;
        }

        if merged.is_empty() {
            return Err(FrauditorError::Page(
                "No reviews harvested from any page".to_string(),
            ));
        }
        Ok(merged)
    }
}

/// Keep only predictions whose index was actually harvested; everything
/// else is a correlation mismatch (typically a stale response racing a
/// pagination) and must be dropped, not applied.
fn correlate(
    batch: &ReviewBatch,
    results: BTreeMap<u32, ClassificationResult>,
) -> (Vec<(u32, ClassificationResult)>, usize) {
    let mut kept = Vec::new();
    let mut dropped = 0;
    for (index, result) in results {
        if batch.contains(index) {
            kept.push((index, result));
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{Prediction, ReviewRecord};

    fn result(prediction: Prediction) -> ClassificationResult {
        ClassificationResult {
            prediction,
            confidence: 0.8,
            analysis: None,
        }
    }

    /// In-memory stand-in for the live page: serves a fixed container
    /// snapshot and records badge upserts the way the DOM would hold them.
    #[derive(Clone, Default)]
    struct ScriptedPage(Arc<Mutex<ScriptedDom>>);

    #[derive(Default)]
    struct ScriptedDom {
        html: String,
        item_count: usize,
        badges: BTreeMap<u32, &'static str>,
    }

    impl ScriptedPage {
        fn load(&self, html: String, item_count: usize) {
            let mut dom = self.0.lock().unwrap();
            dom.html = html;
            dom.item_count = item_count;
            // A page swap replaces the items, dropping their badges.
            dom.badges.clear();
        }

        fn badge_markers(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().badges.values().copied().collect()
        }
    }

    #[async_trait::async_trait]
    impl PageDriver for ScriptedPage {
        async fn wait_until_visible(&self) -> Result<()> {
            Ok(())
        }

        async fn wrapper_opacity(&self) -> Result<f64> {
            Ok(1.0)
        }

        async fn container_html(&self) -> Result<String> {
            Ok(self.0.lock().unwrap().html.clone())
        }

        async fn all_items_badged(&self, _item_class: Option<&str>) -> Result<bool> {
            let dom = self.0.lock().unwrap();
            if dom.item_count == 0 {
                return Ok(false);
            }
            Ok((1..=dom.item_count as u32).all(|i| dom.badges.get(&i) == Some(&"done")))
        }

        async fn render_badge(
            &self,
            _item_class: Option<&str>,
            index: u32,
            state: &BadgeState,
        ) -> Result<()> {
            let marker = match state {
                BadgeState::Loading => "loading",
                BadgeState::Verdict(_) | BadgeState::Error => "done",
            };
            self.0.lock().unwrap().badges.insert(index, marker);
            Ok(())
        }

        async fn click_next(&self) -> Result<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct CountingClassifier {
        calls: AtomicUsize,
    }

    impl CountingClassifier {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Classifier for CountingClassifier {
        async fn classify(
            &self,
            batch: &ReviewBatch,
        ) -> Result<BTreeMap<u32, ClassificationResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(batch
                .indices()
                .map(|i| (i, result(Prediction::Real)))
                .collect())
        }

        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn container_html(users: &[&str]) -> String {
        let items: Vec<String> = users
            .iter()
            .map(|user| {
                format!(
                    r#"<div class="rating-item">
                         <div class="avatar"></div>
                         <div class="main">
                           <div class="author">{}</div>
                           <div class="stars"><i class="star star--filled"></i></div>
                           <div class="time">01 Jan 2024</div>
                         </div>
                       </div>"#,
                    user
                )
            })
            .collect();
        format!(r#"<div class="ratings-list">{}</div>"#, items.join("\n"))
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.page.filled_star_marker = "star--filled".to_string();
        config.page.content_marker = "review-text".to_string();
        config.page.image_marker = "review-images".to_string();
        config
    }

    fn watcher_over(
        page: &ScriptedPage,
        classifier: &Arc<CountingClassifier>,
    ) -> ReviewWatcher {
        ReviewWatcher::new(Box::new(page.clone()), classifier.clone(), test_config())
    }

    #[tokio::test]
    async fn test_cycle_twice_submits_once_when_page_unchanged() {
        let page = ScriptedPage::default();
        page.load(container_html(&["alice", "bob"]), 2);
        let classifier = Arc::new(CountingClassifier::default());
        let mut watcher = watcher_over(&page, &classifier);

        watcher.cycle().await.unwrap();
        assert_eq!(classifier.calls(), 1);
        assert_eq!(page.badge_markers(), vec!["done", "done"]);

        // Re-entrant trigger with no page swap: the badges are still in
        // the DOM, so no second submission happens.
        watcher.cycle().await.unwrap();
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_cycle_resubmits_after_pagination_reset() {
        let page = ScriptedPage::default();
        page.load(container_html(&["alice", "bob"]), 2);
        let classifier = Arc::new(CountingClassifier::default());
        let mut watcher = watcher_over(&page, &classifier);

        watcher.cycle().await.unwrap();
        assert_eq!(classifier.calls(), 1);

        // A real pagination replaces the items and loses their badges.
        page.load(container_html(&["carol", "dave", "erin"]), 3);
        watcher.session.reset_for_pagination();

        watcher.cycle().await.unwrap();
        assert_eq!(classifier.calls(), 2);
        assert_eq!(page.badge_markers(), vec!["done", "done", "done"]);
    }

    #[test]
    fn test_correlate_keeps_harvested_indices() {
        let mut batch = ReviewBatch::new(0);
        batch.insert(1, ReviewRecord::default());
        batch.insert(3, ReviewRecord::default());

        let mut results = BTreeMap::new();
        results.insert(1, result(Prediction::Real));
        results.insert(2, result(Prediction::Fake)); // never harvested
        results.insert(3, result(Prediction::Fake));

        let (kept, dropped) = correlate(&batch, results);
        assert_eq!(dropped, 1);
        let indices: Vec<u32> = kept.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn test_correlate_empty_batch_drops_everything() {
        let batch = ReviewBatch::new(0);
        let mut results = BTreeMap::new();
        results.insert(1, result(Prediction::Real));

        let (kept, dropped) = correlate(&batch, results);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }
}
