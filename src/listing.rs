use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::ListingEntry;

/// Extracts every showing from one day's listing fragment, in document order.
pub fn parse_listing(fragment: &str, base_url: &str) -> Vec<ListingEntry> {
    let doc = Html::parse_fragment(fragment);
    let entry_selector = Selector::parse("div.pastyt").unwrap();
    let title_selector = Selector::parse("a.tyt").unwrap();
    let time_selector = Selector::parse("a.xseans").unwrap();

    let mut out = Vec::new();

    for entry in doc.select(&entry_selector) {
        let Some(anchor) = entry.select(&title_selector).next() else {
            debug!("listing entry without a title anchor");
            continue;
        };
        let title = text_of(anchor);
        if title.is_empty() {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            debug!(title = %title, "title anchor without href");
            continue;
        };

        let times: Vec<String> = times_block(entry)
            .map(|block| {
                block
                    .select(&time_selector)
                    .map(text_of)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        out.push(ListingEntry { title, link: join_url(base_url, href), times });
    }

    out
}

/// The first later sibling `div.seanserep` before the next entry; the listing does not nest
/// times inside the entry.
fn times_block(entry: ElementRef<'_>) -> Option<ElementRef<'_>> {
    entry
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !is_div_with_class(*el, "pastyt"))
        .find(|el| is_div_with_class(*el, "seanserep"))
}

fn is_div_with_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().name() == "div" && el.value().classes().any(|c| c == class)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Resolves `href` against the site root. A base that does not parse as a URL falls back to
/// plain concatenation.
pub fn join_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if let Ok(base_url) = Url::parse(base)
        && let Ok(joined) = base_url.join(href)
    {
        return joined.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), href.trim_start_matches('/'))
}
