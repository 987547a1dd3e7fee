use axum::{
    extract::State,
    response::Html,
    Form,
};
use bucketview_core::{build_gallery, Filter, GalleryIndex, MediaKind};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::state::AppState;

/// First year offered in the filter dropdown; the range always extends to
/// the current year, since uploads are keyed by capture date.
const FIRST_YEAR: i32 = 2000;

#[derive(Deserialize)]
pub struct GalleryForm {
    pub bucket_name: String,
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Empty-state page: bucket picker plus filter controls, no media yet.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let buckets = state.s3.list_buckets().await;
    Html(render_page(&buckets, None, None, None, &GalleryIndex::new()))
}

/// Gallery page for the selected bucket and optional year/month filter.
///
/// Storage failures never surface as an error page; the user gets a
/// normally rendered page with however many items survived.
pub async fn show_gallery(
    State(state): State<AppState>,
    Form(form): Form<GalleryForm>,
) -> Html<String> {
    tracing::info!(
        "Gallery request: bucket={}, year={:?}, month={:?}",
        form.bucket_name,
        form.year,
        form.month
    );

    let buckets = state.s3.list_buckets().await;
    let filter = Filter::new(form.year, form.month);
    let index = build_gallery(&state.s3, &form.bucket_name, &filter).await;

    Html(render_page(
        &buckets,
        Some(&form.bucket_name),
        filter.year.as_deref(),
        filter.month.as_deref(),
        &index,
    ))
}

const PAGE_STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif;
            margin: 0;
            padding: 0;
        }
        h1 {
            text-align: center;
            margin: 20px 0;
        }
        form {
            display: flex;
            justify-content: center;
            gap: 10px;
            margin: 20px 0;
        }
        .gallery {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));
            gap: 10px;
            padding: 10px;
        }
        .gallery img, .gallery video {
            width: 100%;
            height: auto;
            object-fit: cover;
            background-color: #f0f0f0; /* Placeholder background */
        }
"#;

/// Lazy loader: media elements start as placeholders holding their
/// presigned URL in `data-src`; an IntersectionObserver swaps the real
/// source in as they scroll into view, after a client-side sort by the
/// `data-date` attribute.
const PAGE_SCRIPT: &str = r#"
        document.addEventListener("DOMContentLoaded", function() {
            const mediaElements = Array.from(document.querySelectorAll('img[data-src], video[data-src]'));

            const loadMedia = (element) => {
                if (element.tagName === 'IMG') {
                    element.setAttribute('src', element.getAttribute('data-src'));
                    element.onload = () => {
                        element.removeAttribute('data-src');
                    };
                } else if (element.tagName === 'VIDEO') {
                    element.setAttribute('poster', element.getAttribute('data-thumb'));
                    const source = document.createElement('source');
                    source.setAttribute('src', element.getAttribute('data-src'));
                    source.setAttribute('type', element.getAttribute('data-type'));
                    element.appendChild(source);
                    element.removeAttribute('data-src');
                    element.removeAttribute('data-thumb');
                    element.load();
                }
            };

            const observer = new IntersectionObserver((entries, observer) => {
                entries.forEach((entry) => {
                    if (entry.isIntersecting) {
                        loadMedia(entry.target);
                        observer.unobserve(entry.target);
                    }
                });
            });

            // Sort media elements by date before progressive reveal
            mediaElements.sort((a, b) => new Date(b.getAttribute('data-date')) - new Date(a.getAttribute('data-date')));

            mediaElements.forEach((element) => {
                observer.observe(element);
            });
        });
"#;

fn render_page(
    buckets: &[String],
    bucket_name: Option<&str>,
    year: Option<&str>,
    month: Option<&str>,
    index: &GalleryIndex,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Image Gallery</title>
    <style>{style}</style>
    <script>{script}</script>
</head>
<body>
    <h1>Image Gallery</h1>
    <form method="post">
        <label for="bucket_name">Select Bucket:</label>
        <select id="bucket_name" name="bucket_name">
{bucket_options}
        </select>
        <label for="year">Select Year:</label>
        <select id="year" name="year">
{year_options}
        </select>
        <label for="month">Select Month:</label>
        <select id="month" name="month">
{month_options}
        </select>
        <button type="submit">Load Media</button>
    </form>
    <hr>
{gallery}
</body>
</html>"#,
        style = PAGE_STYLE,
        script = PAGE_SCRIPT,
        bucket_options = render_bucket_options(buckets, bucket_name),
        year_options = render_year_options(year, Utc::now().year()),
        month_options = render_month_options(month),
        gallery = render_gallery(bucket_name, year, month, index),
    )
}

fn render_bucket_options(buckets: &[String], selected: Option<&str>) -> String {
    buckets
        .iter()
        .map(|bucket| {
            format!(
                r#"            <option value="{value}"{selected}>{value}</option>"#,
                value = html_escape(bucket),
                selected = selected_attr(selected == Some(bucket.as_str())),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_year_options(selected: Option<&str>, latest_year: i32) -> String {
    let mut options = vec![format!(
        r#"            <option value=""{}>All</option>"#,
        selected_attr(selected.is_none())
    )];
    for year in FIRST_YEAR..=latest_year {
        let value = year.to_string();
        options.push(format!(
            r#"            <option value="{value}"{selected}>{value}</option>"#,
            value = value,
            selected = selected_attr(selected == Some(value.as_str())),
        ));
    }
    options.join("\n")
}

fn render_month_options(selected: Option<&str>) -> String {
    let mut options = vec![format!(
        r#"            <option value=""{}>All</option>"#,
        selected_attr(selected.is_none())
    )];
    for month in 1..=12u32 {
        let value = format!("{month:02}");
        options.push(format!(
            r#"            <option value="{value}"{selected}>{value}</option>"#,
            value = value,
            selected = selected_attr(selected == Some(value.as_str())),
        ));
    }
    options.join("\n")
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}

fn render_gallery(
    bucket_name: Option<&str>,
    year: Option<&str>,
    month: Option<&str>,
    index: &GalleryIndex,
) -> String {
    let Some(bucket) = bucket_name else {
        return String::new();
    };

    let mut html = format!(
        "    <h2>Media from Bucket: {}</h2>\n",
        html_escape(bucket)
    );
    if let Some(year) = year {
        html.push_str(&format!("    <h3>Year: {}</h3>\n", html_escape(year)));
    }
    if let Some(month) = month {
        html.push_str(&format!("    <h3>Month: {}</h3>\n", html_escape(month)));
    }

    for (date, items) in index {
        html.push_str(&format!("    <h3>{}</h3>\n", html_escape(date)));
        html.push_str("    <div class=\"gallery\">\n");
        for item in items {
            html.push_str(&render_media_element(date, item));
        }
        html.push_str("    </div>\n");
    }

    html
}

fn render_media_element(date: &str, item: &bucketview_core::MediaItem) -> String {
    // Presigned URLs carry query strings, so they go through the same
    // escaping as everything else before landing in an attribute.
    let url = html_escape(&item.url);
    let thumb = item
        .thumb_url
        .as_deref()
        .map(html_escape)
        .unwrap_or_default();
    let date = html_escape(date);

    match item.kind {
        MediaKind::Image => format!(
            r#"        <img data-src="{url}" src="{thumb}" data-date="{date}" alt="Image" loading="lazy">
"#,
        ),
        MediaKind::Video => format!(
            r#"        <video data-src="{url}" data-thumb="{thumb}" data-type="video/mp4" data-date="{date}" controls loading="lazy"></video>
"#,
        ),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
