use std::path::Path;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::page::ReviewPage;
use crate::watcher::ReviewWatcher;

pub async fn watch(ctx: &AppContext, url: &str, headful: bool) -> Result<()> {
    let mut watcher = build_watcher(ctx, url, headful).await?;
    println!("Watching {} (Ctrl-C to stop)", url);

    tokio::select! {
        res = watcher.run() => res,
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopped");
            Ok(())
        }
    }
}

pub async fn scan(
    ctx: &AppContext,
    url: &str,
    pages: u32,
    out: Option<&Path>,
    no_submit: bool,
    headful: bool,
) -> Result<()> {
    let mut watcher = build_watcher(ctx, url, headful).await?;

    let batch = watcher.crawl(pages).await?;
    println!("Harvested {} reviews", batch.len());

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&batch)?;
        std::fs::write(path, json)?;
        println!("Wrote {}", path.display());
    }

    if no_submit {
        return Ok(());
    }

    let results = ctx.classifier.classify(&batch).await?;
    let mut dropped = 0;
    for (index, result) in results {
        if !batch.contains(index) {
            dropped += 1;
            continue;
        }
        println!(
            "  review {}: {} ({}%)",
            index,
            result.prediction,
            result.confidence_percent()
        );
    }
    if dropped > 0 {
        eprintln!("  {} predictions did not match a harvested review", dropped);
    }

    Ok(())
}

pub async fn check(ctx: &AppContext) -> Result<()> {
    match ctx.classifier.health().await {
        Ok(()) => {
            println!("Classifier is reachable at {}", ctx.config.classifier.endpoint);
            Ok(())
        }
        Err(e) => {
            eprintln!("Classifier unreachable: {}", e);
            Err(e)
        }
    }
}

pub fn config_path() -> Result<()> {
    let path = Config::default_config_path()?;
    println!("{}", path.display());
    Ok(())
}

async fn build_watcher(ctx: &AppContext, url: &str, headful: bool) -> Result<ReviewWatcher> {
    let mut page_config = ctx.config.page.clone();
    if headful {
        page_config.headless = false;
    }

    let page = ReviewPage::open(url, page_config).await?;
    Ok(ReviewWatcher::new(
        Box::new(page),
        ctx.classifier.clone(),
        ctx.config.clone(),
    ))
}
