use super::movies::page_footer;
use super::AppContext;
use crate::output::{Output, OutputFormat};
use cinelog_core::{StatsSource, ToggleOutcome};
use cinelog_models::{WatchlistItem, WatchlistStats, WatchlistStatus};
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use serde_json::json;

pub async fn run_list(
    context: &AppContext,
    status: Option<WatchlistStatus>,
    page: u32,
    output: &Output,
) -> Result<()> {
    let store = context.authenticated_store().await?;
    store
        .fetch_watchlist(page, status)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    let snapshot = store.get_snapshot();
    if output.format() != OutputFormat::Human {
        output.json(&json!({
            "items": snapshot.watchlist_items,
            "stats": snapshot.watchlist_stats,
            "statsSource": snapshot.stats_source,
            "pagination": snapshot.pagination.watchlist,
        }));
        return Ok(());
    }

    if snapshot.watchlist_items.is_empty() {
        output.info("Watchlist is empty");
    } else {
        output.render(|| item_table(&snapshot.watchlist_items), &snapshot.watchlist_items);
        page_footer(output, &snapshot.pagination.watchlist, "items");
    }
    output.render(|| stats_table(&snapshot.watchlist_stats, snapshot.stats_source), &snapshot.watchlist_stats);
    Ok(())
}

pub async fn run_add(
    context: &AppContext,
    movie_id: &str,
    status: Option<WatchlistStatus>,
    output: &Output,
) -> Result<()> {
    let status = status.unwrap_or(context.config.catalog.default_watchlist_status);
    let store = context.authenticated_store().await?;
    let item = store
        .add_to_watchlist(movie_id, status)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    report_item(output, "Added to watchlist", &item);
    Ok(())
}

pub async fn run_remove(context: &AppContext, movie_id: &str, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    store
        .remove_from_watchlist(movie_id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    output.success(format!("Removed {} from watchlist", movie_id));
    Ok(())
}

pub async fn run_toggle(context: &AppContext, movie_id: &str, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    // Toggling decides from the status map, so the movie's page has to be loaded
    store
        .seek_watchlist_entry(movie_id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    let outcome = store
        .toggle_watchlist(movie_id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    match outcome {
        ToggleOutcome::Added(item) => report_item(output, "Added to watchlist", &item),
        ToggleOutcome::Removed => output.success(format!("Removed {} from watchlist", movie_id)),
    }
    Ok(())
}

pub async fn run_status(
    context: &AppContext,
    movie_id: &str,
    status: WatchlistStatus,
    output: &Output,
) -> Result<()> {
    let store = context.authenticated_store().await?;
    let item = store
        .update_watchlist_status(movie_id, status)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    report_item(output, "Status updated", &item);
    Ok(())
}

pub async fn run_stats(context: &AppContext, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    let stats = store
        .fetch_watchlist_stats()
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    output.render(|| stats_table(&stats, StatsSource::Server), &stats);
    Ok(())
}

fn report_item(output: &Output, message: &str, item: &WatchlistItem) {
    if output.format() == OutputFormat::Human {
        output.success(format!("{}: {} ({})", message, item.movie_id, status_label(item.status)));
    } else {
        output.json(&json!({ "message": message, "item": item }));
    }
}

fn status_label(status: WatchlistStatus) -> &'static str {
    match status {
        WatchlistStatus::WantToWatch => "want to watch",
        WatchlistStatus::Watching => "watching",
        WatchlistStatus::Watched => "watched",
    }
}

fn status_color(status: WatchlistStatus) -> Color {
    match status {
        WatchlistStatus::WantToWatch => Color::Yellow,
        WatchlistStatus::Watching => Color::Cyan,
        WatchlistStatus::Watched => Color::Green,
    }
}

fn item_table(items: &[WatchlistItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Movie").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Status").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Added").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.movie_id),
            Cell::new(item.movie.as_ref().map(|m| m.title.as_str()).unwrap_or("")),
            Cell::new(status_label(item.status)).fg(status_color(item.status)),
            Cell::new(item.created_at.format("%Y-%m-%d").to_string()),
        ]);
    }
    table
}

fn stats_table(stats: &WatchlistStats, source: StatsSource) -> Table {
    let mut table = Table::new();
    let title = match source {
        StatsSource::Local => "Watchlist totals",
        StatsSource::Server => "Watchlist totals (server)",
    };
    table.set_header(vec![
        Cell::new(title).fg(Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    for status in WatchlistStatus::ALL {
        table.add_row(vec![
            Cell::new(status_label(status)).fg(status_color(status)),
            Cell::new(stats.count(status)),
        ]);
    }
    table.add_row(vec![
        Cell::new("total").add_attribute(comfy_table::Attribute::Bold),
        Cell::new(stats.total),
    ]);
    table
}
