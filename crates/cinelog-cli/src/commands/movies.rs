use super::{reviews, stars, truncate, AppContext};
use crate::output::Output;
use cinelog_core::PaginationCursor;
use cinelog_models::{Movie, MovieFilters};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_list(context: &AppContext, filters: MovieFilters, page: u32, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .fetch_movies(&filters, page)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    let snapshot = store.get_snapshot();
    output.render(
        || movie_table(&snapshot.movies),
        &json!({ "movies": snapshot.movies, "pagination": snapshot.pagination.movies }),
    );
    page_footer(output, &snapshot.pagination.movies, "movies");
    Ok(())
}

pub async fn run_show(context: &AppContext, id: &str, output: &Output) -> Result<()> {
    let store = context.store();
    let movie = store
        .fetch_movie(id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    store
        .fetch_reviews(id, 1)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    let snapshot = store.get_snapshot();
    output.render(
        || movie_detail_table(&movie),
        &json!({ "movie": movie, "reviews": snapshot.reviews, "pagination": snapshot.pagination.movie_reviews }),
    );
    if output.format() == crate::output::OutputFormat::Human && !snapshot.reviews.is_empty() {
        output.render(|| reviews::review_table(&snapshot.reviews), &snapshot.reviews);
        page_footer(output, &snapshot.pagination.movie_reviews, "reviews");
    }
    Ok(())
}

pub async fn run_featured(context: &AppContext, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .fetch_featured()
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    let snapshot = store.get_snapshot();
    output.render(|| movie_table(&snapshot.featured_movies), &snapshot.featured_movies);
    Ok(())
}

pub async fn run_trending(context: &AppContext, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .fetch_trending()
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    let snapshot = store.get_snapshot();
    output.render(|| movie_table(&snapshot.trending_movies), &snapshot.trending_movies);
    Ok(())
}

pub async fn run_search(context: &AppContext, query: &str, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .search_movies(query)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    let snapshot = store.get_snapshot();
    if snapshot.search_results.is_empty() {
        output.info(format!("No movies match '{}'", query));
        return Ok(());
    }
    output.render(|| movie_table(&snapshot.search_results), &snapshot.search_results);
    Ok(())
}

pub(crate) fn page_footer(output: &Output, cursor: &PaginationCursor, noun: &str) {
    if cursor.total_pages() <= 1 {
        return;
    }
    let mut footer = format!(
        "Page {} of {} ({} {})",
        cursor.current_page(),
        cursor.total_pages(),
        cursor.total_items(),
        noun
    );
    if cursor.has_next() {
        footer.push_str(&format!(", next: --page {}", cursor.current_page() + 1));
    }
    output.info(footer.bright_black().to_string());
}

fn movie_table(movies: &[Movie]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Genres").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Reviews").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for movie in movies {
        table.add_row(vec![
            Cell::new(&movie.id),
            Cell::new(&movie.title),
            Cell::new(movie.release_year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(movie.genre.iter().cloned().collect::<Vec<_>>().join(", ")),
            Cell::new(format!("{} {:.1}", stars(movie.average_rating), movie.average_rating)),
            Cell::new(movie.total_reviews),
        ]);
    }
    table
}

fn movie_detail_table(movie: &Movie) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(&movie.title).fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    if let Some(year) = movie.release_year {
        table.add_row(vec![Cell::new("Year"), Cell::new(year)]);
    }
    if let Some(director) = &movie.director {
        table.add_row(vec![Cell::new("Director"), Cell::new(director)]);
    }
    if let Some(duration) = movie.duration {
        table.add_row(vec![Cell::new("Runtime"), Cell::new(format!("{}h {:02}m", duration / 60, duration % 60))]);
    }
    if !movie.genre.is_empty() {
        table.add_row(vec![
            Cell::new("Genres"),
            Cell::new(movie.genre.iter().cloned().collect::<Vec<_>>().join(", ")),
        ]);
    }
    if !movie.cast.is_empty() {
        table.add_row(vec![Cell::new("Cast"), Cell::new(truncate(&movie.cast.join(", "), 80))]);
    }
    table.add_row(vec![
        Cell::new("Rating"),
        Cell::new(format!(
            "{} {:.1} ({} reviews)",
            stars(movie.average_rating),
            movie.average_rating,
            movie.total_reviews
        )),
    ]);
    if let Some(synopsis) = &movie.synopsis {
        table.add_row(vec![Cell::new("Synopsis"), Cell::new(synopsis)]);
    }
    table
}
