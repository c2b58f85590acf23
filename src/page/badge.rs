//! Badge rendering: the small element injected under each review item.
//!
//! Badges are keyed `b{index}` and re-rendered in place, so repeated cycles
//! update rather than duplicate them. The `data-frauditor` attribute is the
//! "already badged" marker the duplicate-submission guard looks for.

use crate::domain::{Analysis, ClassificationResult};

/// Visual state of one review's badge.
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeState {
    /// Submitted, verdict pending.
    Loading,
    /// Verdict received.
    Verdict(ClassificationResult),
    /// Submission failed; not retried automatically.
    Error,
}

impl BadgeState {
    /// CSS class conveying the state, matching the page styles.
    pub fn class_name(&self) -> &'static str {
        match self {
            BadgeState::Loading => "loading",
            BadgeState::Verdict(result) if result.prediction.is_fake() => "yfraud",
            BadgeState::Verdict(_) => "nfraud",
            BadgeState::Error => "error",
        }
    }

    /// Value for the `data-frauditor` marker. Only finalized badges count
    /// for the duplicate-submission guard.
    fn marker(&self) -> &'static str {
        match self {
            BadgeState::Loading => "loading",
            BadgeState::Verdict(_) | BadgeState::Error => "done",
        }
    }

    fn inner_html(&self) -> String {
        match self {
            BadgeState::Loading => {
                r#"<span class="frauditor-badge__label">Checking...</span>"#.to_string()
            }
            BadgeState::Verdict(result) => {
                let percent = result.confidence_percent();
                format!(
                    r#"<span class="frauditor-badge__label">{}</span><span class="frauditor-badge__bar" style="width:{}%"></span><span class="frauditor-badge__pct">{}%</span>"#,
                    result.prediction, percent, percent
                )
            }
            BadgeState::Error => {
                r#"<span class="frauditor-badge__label">Check failed</span>"#.to_string()
            }
        }
    }

    /// Hover tooltip summarizing the analysis detail, when present.
    fn tooltip(&self) -> String {
        match self {
            BadgeState::Verdict(ClassificationResult {
                analysis: Some(analysis),
                ..
            }) => analysis_summary(analysis),
            _ => String::new(),
        }
    }
}

fn analysis_summary(analysis: &Analysis) -> String {
    let mut parts = Vec::new();
    if let Some(v) = analysis.sentiment_score {
        parts.push(format!("sentiment {:.2}", v));
    }
    if let Some(v) = analysis.quality_score {
        parts.push(format!("quality {:.0}", v));
    }
    if let Some(v) = analysis.malaysian_terms {
        parts.push(format!("{} local terms", v));
    }
    if let Some(v) = analysis.word_count {
        parts.push(format!("{} words", v));
    }
    if let Some(v) = analysis.prediction_time {
        parts.push(format!("{:.0}ms", v * 1000.0));
    }
    parts.join(", ")
}

/// Badge element id for a review index: `b{index}`.
pub fn badge_id(index: u32) -> String {
    format!("b{}", index)
}

/// JavaScript that upserts the badge for the index-th review item under
/// the container. Items are the children carrying `item_class` when one is
/// known; indexing all children instead would let an injected foreign node
/// (an ad banner, say) shift every badge onto the wrong element. Returns
/// false (from the page) when the item no longer exists, e.g. after a
/// pagination the caller hasn't observed yet.
pub fn render_script(
    container_selector: &str,
    item_class: Option<&str>,
    index: u32,
    state: &BadgeState,
) -> String {
    format!(
        r#"
        (() => {{
            const container = document.querySelector({container});
            if (!container) return false;
            const cls = {cls};
            let items = Array.from(container.children);
            if (cls) items = items.filter(el => el.classList.contains(cls));
            const item = items[{offset}];
            if (!item) return false;
            let badge = item.querySelector('#{id}');
            if (!badge) {{
                badge = document.createElement('div');
                badge.id = '{id}';
                item.appendChild(badge);
            }}
            badge.className = 'frauditor-badge {class}';
            badge.dataset.frauditor = '{marker}';
            badge.title = {title};
            badge.innerHTML = {html};
            return true;
        }})()
        "#,
        container = js_string(container_selector),
        cls = js_class(item_class),
        offset = index.saturating_sub(1),
        id = badge_id(index),
        class = state.class_name(),
        marker = state.marker(),
        title = js_string(&state.tooltip()),
        html = js_string(&state.inner_html()),
    )
}

/// JavaScript that reports whether every review item under the container
/// already carries a finalized badge. Same item addressing as
/// [`render_script`]: only `item_class`-bearing children count, so a
/// foreign child can never hold the check open forever.
pub fn all_badged_script(container_selector: &str, item_class: Option<&str>) -> String {
    format!(
        r#"
        (() => {{
            const container = document.querySelector({container});
            if (!container) return false;
            const cls = {cls};
            let items = Array.from(container.children);
            if (cls) items = items.filter(el => el.classList.contains(cls));
            if (items.length === 0) return false;
            return items.every(item => item.querySelector('[data-frauditor="done"]') !== null);
        }})()
        "#,
        container = js_string(container_selector),
        cls = js_class(item_class),
    )
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn js_class(item_class: Option<&str>) -> String {
    item_class.map_or_else(|| "null".to_string(), js_string)
}
