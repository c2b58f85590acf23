//! # Frauditor
//!
//! Scrapes product reviews from a live e-commerce product page, submits them
//! to a remote authenticity classifier, and badges each review on the page
//! with the verdict.
//!
//! ## Architecture
//!
//! ```text
//! Visibility gate → Harvester → Classifier → Badge annotator
//!        ↑                                        |
//!        └──────── Pagination tracker ◄───────────┘
//! ```
//!
//! - [`extract`]: pulls structured [`ReviewRecord`](domain::ReviewRecord)s
//!   out of the rendered review list
//! - [`page`]: drives the page through headless Chrome and watches the
//!   pagination transition signal
//! - [`classifier`]: HTTP client for the classification service
//! - [`watcher`]: orchestrates the full cycle and its re-entry guards
//!
//! ## Quick Start
//!
//! ```bash
//! # Badge reviews live while you browse
//! frauditor watch https://example.shop/product/123
//!
//! # One-shot harvest across up to 3 pages, dumped as JSON
//! frauditor scan https://example.shop/product/123 --pages 3 --out reviews.json
//!
//! # Is the classification service up?
//! frauditor check
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config and the
/// classifier client.
pub mod app;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `watch <url>` - Badge reviews live as the page renders and paginates
/// - `scan <url>` - One-shot harvest, optionally across several pages
/// - `check` - Probe the classification service
/// - `config-path` - Print the config file location
pub mod cli;

/// Classification service client.
///
/// - [`Classifier`](classifier::Classifier): Async trait for the service seam
/// - [`HttpClassifier`](classifier::HttpClassifier): reqwest-based implementation
pub mod classifier;

/// Configuration management.
///
/// Loads from `~/.config/frauditor/config.toml`, covering page selectors
/// and markers, timing (settle delay, polling), the classifier endpoint,
/// and the multi-page crawl cap.
pub mod config;

/// Core domain models.
///
/// - [`ReviewRecord`](domain::ReviewRecord): One scraped review
/// - [`ReviewBatch`](domain::ReviewBatch): An indexed harvest, `review 1..N`
/// - [`ClassificationResult`](domain::ClassificationResult): Verdict per review
pub mod domain;

/// Review extraction from rendered HTML.
///
/// The field extractor walks one review item's positional structure through
/// a shape-declaring accessor; the harvester runs it over every rendered
/// item and omits the ones that don't match.
pub mod extract;

/// Live page driving via headless Chrome.
///
/// - [`ReviewPage`](page::ReviewPage): chromiumoxide-backed page handle
/// - [`PaginationTracker`](page::PaginationTracker): opacity-driven state machine
/// - [`PageSession`](page::PageSession): per-page-view state and generation counter
pub mod page;

/// The harvest/classify/annotate orchestration loop.
pub mod watcher;
