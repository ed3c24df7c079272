//! Landing page.

use axum::response::Html;

use crate::templates::{current_year, render_page};

/// Render the upload form.
pub async fn index() -> Html<String> {
    Html(render_page(current_year(), None))
}
