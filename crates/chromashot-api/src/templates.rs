//! Landing page markup.

use chrono::{Datelike, Local};

use chromashot_models::JobId;

/// Public URL of a job's output image.
pub fn image_url(id: &JobId) -> String {
    format!("/image/{}.png", id)
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Render the landing page, optionally showing a produced image.
///
/// `image_url` is only ever built by [`image_url`] from a generated id, so it
/// is inserted without escaping.
pub fn render_page(current_year: i32, image_url: Option<&str>) -> String {
    let result = match image_url {
        Some(url) => format!(
            r#"
    <section class="result">
      <h2>Your chromashot</h2>
      <img src="{url}" alt="Colour timeline of the uploaded video">
      <p class="hint">This image is served once. Save it before leaving the page.</p>
    </section>"#
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Chromashot</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
    img {{ max-width: 100%; image-rendering: pixelated; border: 1px solid #ccc; }}
    .hint {{ color: #666; font-size: 0.9rem; }}
    footer {{ margin-top: 3rem; color: #888; font-size: 0.8rem; }}
  </style>
</head>
<body>
  <h1>Chromashot</h1>
  <p>Upload a video to get a single image of its colours over time.</p>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="video" accept="video/*" required>
    <button type="submit">Convert</button>
  </form>{result}
  <footer>&copy; {current_year} Chromashot</footer>
</body>
</html>
"#
    )
}
