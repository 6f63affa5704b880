use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;

use crate::app::{AppContext, Result, TrackerError};
use crate::domain::{BatchItem, Blogger, ItemResult, Platform, ProgressEvent};
use crate::refresh::{spawn_batch, PageSession, RefreshConfig, RefreshController};
use crate::store::{RefreshFilter, Store};

pub const DEFAULT_HISTORY_DAYS: i64 = 30;

pub fn add_blogger(ctx: &AppContext, nickname: &str, link: Option<&str>) -> Result<i64> {
    let mut blogger = Blogger::new(nickname.trim());
    if let Some(link) = link.map(str::trim).filter(|l| !l.is_empty()) {
        let url = url::Url::parse(link)?;
        blogger = blogger.with_link(url.as_str());
    }

    let id = ctx.store.add_blogger(&blogger)?;
    println!("Added blogger [{}] {}", id, blogger.display_name());
    if blogger.xhs_link.is_none() {
        println!("  No post link yet, it will be skipped on refresh");
    }
    Ok(id)
}

pub fn remove_blogger(ctx: &AppContext, id: i64) -> Result<()> {
    let blogger = ctx
        .store
        .get_blogger(id)?
        .ok_or(TrackerError::BloggerNotFound(id))?;

    ctx.store.delete_blogger(id)?;
    println!("Removed blogger [{}] {}", id, blogger.display_name());
    Ok(())
}

pub fn list_bloggers(ctx: &AppContext) -> Result<()> {
    let bloggers = ctx.store.get_all_bloggers()?;

    if bloggers.is_empty() {
        println!("No bloggers");
        return Ok(());
    }

    for blogger in bloggers {
        println!("[{}] {}", blogger.id, blogger.display_name());
        println!("  {}", blogger.xhs_link.as_deref().unwrap_or("(no link)"));
        match (blogger.metrics, blogger.metrics_updated_at) {
            (Some(m), Some(at)) => println!(
                "  likes {}  favorites {}  comments {}  shares {}  ({})",
                m.likes,
                m.favorites,
                m.comments,
                m.shares,
                at.format("%Y-%m-%d %H:%M")
            ),
            _ => println!("  never refreshed"),
        }
    }

    Ok(())
}

/// Per-run overrides of the `[refresh]` config section.
#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    pub ids: Vec<i64>,
    pub headful: bool,
    pub headless: bool,
    pub keep_open: bool,
    pub json: bool,
}

impl RefreshOptions {
    pub fn apply(&self, base: &RefreshConfig) -> RefreshConfig {
        let mut config = base.clone();
        if self.headful {
            config.headless = false;
        }
        if self.headless {
            config.headless = true;
        }
        if self.keep_open {
            config.debug_keep_session_open = true;
        }
        config
    }
}

pub async fn refresh(ctx: &AppContext, options: &RefreshOptions) -> Result<()> {
    let config = options.apply(&ctx.config.refresh);
    let items = ctx
        .store
        .list_refreshable(&RefreshFilter::ids(options.ids.iter().copied()))?;

    if items.is_empty() {
        println!("No bloggers to refresh");
        return Ok(());
    }

    if !options.json {
        println!("Refreshing {} bloggers...", items.len());
        if !config.headless {
            println!(
                "If the page asks for a login, log in within {}s in the browser window",
                config.login_wait().as_secs()
            );
        }
    }

    let controller = ctx.refresh_controller(config);
    run_refresh(controller, items, options.json).await?;
    Ok(())
}

/// Run a batch, printing its progress as it happens.
pub async fn run_refresh<P, S>(
    controller: RefreshController<P, S>,
    items: Vec<BatchItem>,
    json: bool,
) -> Result<Vec<ItemResult>>
where
    P: PageSession + 'static,
    S: Store + Send + Sync + 'static,
{
    let mut run = spawn_batch(controller, items);

    while let Some(event) = run.events.next().await {
        if json {
            let line = serde_json::to_string(&event)
                .map_err(|e| TrackerError::Other(format!("Failed to encode event: {}", e)))?;
            println!("{}", line);
        } else if let Some(line) = format_event(&event) {
            println!("{}", line);
        }
    }

    let (mut controller, outcome) = run
        .handle
        .await
        .map_err(|e| TrackerError::Other(format!("Refresh task failed: {}", e)))?;

    if controller.config().debug_keep_session_open && controller.session().is_open() {
        println!("Browser left open for inspection, press Ctrl+C to close it");
        tokio::signal::ctrl_c().await?;
        if let Err(e) = controller.close_session().await {
            eprintln!("Failed to close browser: {}", e);
        }
    }

    match outcome {
        Ok(results) => {
            if !json {
                print_summary(&results);
            }
            Ok(results)
        }
        Err(e) => {
            if !json {
                print_summary(e.partial_results());
            }
            Err(e.into())
        }
    }
}

fn format_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Processing {
            current,
            total,
            display_name,
        } => Some(format!("[{}/{}] {}", current, total, display_name)),
        ProgressEvent::Error {
            display_name,
            message,
        } => Some(format!("  ! {}: {}", display_name, message)),
        ProgressEvent::Completed { .. } => None,
    }
}

fn format_result(result: &ItemResult) -> String {
    match (&result.metrics, &result.error) {
        (Some(m), None) if result.success => {
            let mut line = format!(
                "  + {}: likes {}, favorites {}, comments {}, shares {}",
                result.display_name, m.likes, m.favorites, m.comments, m.shares
            );
            if let Some(ref warning) = result.warning {
                line.push_str(&format!(" ({})", warning));
            }
            line
        }
        (_, error) => format!(
            "  - {}: {}",
            result.display_name,
            error.as_deref().unwrap_or("failed")
        ),
    }
}

fn print_summary(results: &[ItemResult]) {
    let succeeded = results.iter().filter(|r| r.success).count();

    println!();
    for result in results {
        println!("{}", format_result(result));
    }
    println!(
        "\nRefresh complete: {} succeeded, {} failed",
        succeeded,
        results.len() - succeeded
    );
}

/// Start of a `days`-long history window ending at `now`.
fn history_since(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            TrackerError::Other(format!("History window of {} days is out of range", days))
        })
}

pub fn show_history(ctx: &AppContext, id: i64, days: i64) -> Result<()> {
    let blogger = ctx
        .store
        .get_blogger(id)?
        .ok_or(TrackerError::BloggerNotFound(id))?;

    let since = history_since(Utc::now(), days)?;
    let records = ctx.store.get_history(id, Platform::Xiaohongshu, since)?;

    if records.is_empty() {
        println!(
            "No history for {} in the last {} days",
            blogger.display_name(),
            days
        );
        return Ok(());
    }

    println!("{} ({} records)", blogger.display_name(), records.len());
    println!(
        "  {:<16} {:>10} {:>10} {:>10} {:>10}",
        "recorded", "likes", "favorites", "comments", "shares"
    );
    for record in records {
        let m = record.metrics;
        println!(
            "  {:<16} {:>10} {:>10} {:>10} {:>10}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            m.likes,
            m.favorites,
            m.comments,
            m.shares
        );
    }

    Ok(())
}
