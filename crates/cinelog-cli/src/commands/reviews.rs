use super::movies::page_footer;
use super::{prompts, truncate, AppContext};
use crate::output::Output;
use cinelog_models::{Review, ReviewEdit};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;

pub async fn run_list(context: &AppContext, movie_id: &str, page: u32, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .fetch_reviews(movie_id, page)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    let snapshot = store.get_snapshot();
    if snapshot.reviews.is_empty() {
        output.info("No reviews yet");
        return Ok(());
    }
    output.render(
        || review_table(&snapshot.reviews),
        &json!({ "reviews": snapshot.reviews, "pagination": snapshot.pagination.movie_reviews }),
    );
    page_footer(output, &snapshot.pagination.movie_reviews, "reviews");
    Ok(())
}

pub async fn run_mine(context: &AppContext, page: u32, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    store
        .fetch_my_reviews(page)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    render_user_reviews(&store.get_snapshot(), output);
    Ok(())
}

pub async fn run_user(context: &AppContext, user_id: &str, page: u32, output: &Output) -> Result<()> {
    let store = context.store();
    store
        .fetch_user_reviews(user_id, page)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    render_user_reviews(&store.get_snapshot(), output);
    Ok(())
}

pub async fn run_submit(
    context: &AppContext,
    movie_id: &str,
    rating: u8,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => prompts::prompt_review_text(movie_id, rating)?,
    };
    let store = context.authenticated_store().await?;
    let review = store
        .submit_review(movie_id, rating, &text)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    output.success(format!("Review {} posted", review.id));
    output.render(|| review_table(std::slice::from_ref(&review)), &review);
    Ok(())
}

pub async fn run_edit(
    context: &AppContext,
    review_id: &str,
    rating: Option<u8>,
    text: Option<String>,
    output: &Output,
) -> Result<()> {
    if rating.is_none() && text.is_none() {
        return Err(eyre!("Pass --rating and/or --text"));
    }
    let store = context.authenticated_store().await?;
    let edit = ReviewEdit { rating, review_text: text };
    let review = store
        .update_review(review_id, edit)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    output.success(format!("Review {} updated", review.id));
    output.render(|| review_table(std::slice::from_ref(&review)), &review);
    Ok(())
}

pub async fn run_delete(context: &AppContext, review_id: &str, yes: bool, output: &Output) -> Result<()> {
    if !yes && !prompts::confirm_review_delete(review_id)? {
        output.info("Cancelled");
        return Ok(());
    }
    let store = context.authenticated_store().await?;
    store
        .delete_review(review_id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;
    output.success(format!("Review {} deleted", review_id));
    Ok(())
}

pub async fn run_helpful(context: &AppContext, review_id: &str, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    let votes = store
        .mark_review_helpful(review_id)
        .await
        .map_err(|e| context.dispatch_error(&store, e))?;

    if output.format() == crate::output::OutputFormat::Human {
        output.success(format!("Marked helpful ({} votes)", votes));
    } else {
        output.json(&json!({ "reviewId": review_id, "helpfulVotes": votes }));
    }
    Ok(())
}

fn render_user_reviews(snapshot: &cinelog_core::Snapshot, output: &Output) {
    if snapshot.user_reviews.is_empty() {
        output.info("No reviews yet");
        return;
    }
    output.render(
        || review_table(&snapshot.user_reviews),
        &json!({ "reviews": snapshot.user_reviews, "pagination": snapshot.pagination.user_reviews }),
    );
    page_footer(output, &snapshot.pagination.user_reviews, "reviews");
}

pub(crate) fn review_table(reviews: &[Review]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Movie").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Author").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Review").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Helpful").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Date").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for review in reviews {
        table.add_row(vec![
            Cell::new(&review.id),
            Cell::new(&review.movie_id),
            Cell::new(review.username.as_deref().unwrap_or(&review.user_id)),
            Cell::new(format!("{}/5", review.rating)),
            Cell::new(truncate(&review.review_text, 60)),
            Cell::new(review.helpful_votes),
            Cell::new(review.created_at.format("%Y-%m-%d").to_string()),
        ]);
    }
    table
}
