//! Release list parser for TNTVillage
//!
//! Parses HTML from `releaselist.php` responses: the pagination control and
//! the release table.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, TntError};
use crate::types::RawCandidate;

/// Column positions in the release table
const LINK_CELL: usize = 0;
const LEECHERS_CELL: usize = 3;
const SEEDERS_CELL: usize = 4;
const TITLE_CELL: usize = 6;

/// Length of the attachment id at the end of a download href
const TOKEN_LEN: usize = 8;

/// Highest page count accepted from the pagination control
pub const MAX_LAST_PAGE: u32 = 10_000;

/// Rows extracted from one release list page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseTable {
    /// Data rows present in the table (header excluded), valid or not
    pub row_count: usize,
    /// Rows that yielded a complete candidate
    pub candidates: Vec<RawCandidate>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TntError::ParseError(format!("Invalid selector: {:?}", e)))
}

/// Read the highest page number from the pagination control.
///
/// The site renders the page number in the `p` attribute of each `li`;
/// the last one is the final page, `0` when the query matched nothing.
///
/// # Errors
/// - `TntError::ElementNotFound` if the pagination control or its items are missing
/// - `TntError::ParseError` if the page attribute is not a number or
///   exceeds [`MAX_LAST_PAGE`]
pub fn parse_last_page(html: &str) -> Result<u32> {
    let document = Html::parse_document(html);

    let pagination_selector = selector("div.pagination")?;
    let item_selector = selector("li")?;

    let pagination = document
        .select(&pagination_selector)
        .next()
        .ok_or_else(|| TntError::ElementNotFound("div.pagination".to_string()))?;

    let last_item = pagination
        .select(&item_selector)
        .last()
        .ok_or_else(|| TntError::ElementNotFound("div.pagination li".to_string()))?;

    let page_attr = last_item
        .value()
        .attr("p")
        .ok_or_else(|| TntError::ElementNotFound("div.pagination li[p]".to_string()))?;

    let last_page: u32 = page_attr
        .trim()
        .parse()
        .map_err(|_| TntError::ParseError(format!("Invalid page number: {:?}", page_attr)))?;

    if last_page > MAX_LAST_PAGE {
        return Err(TntError::ParseError(format!(
            "Page count out of range: {}",
            last_page
        )));
    }

    Ok(last_page)
}

/// Extract release rows from a release list page.
///
/// Rows missing a cell, a download link or a numeric peer count are
/// skipped; the rest of the page is still returned.
///
/// # Errors
/// Returns `TntError::ParseError` only if the selectors cannot be built.
pub fn parse_releases(html: &str) -> Result<ReleaseTable> {
    let document = Html::parse_document(html);

    let table_selector = selector("div.showrelease_tb")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a")?;

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(ReleaseTable::default());
    };

    let rows: Vec<ElementRef> = table.select(&row_selector).collect();
    let data_rows = rows.iter().skip(1);

    let candidates = data_rows
        .clone()
        .filter_map(|row| parse_release_row(row, &cell_selector, &link_selector))
        .collect();

    Ok(ReleaseTable {
        row_count: data_rows.count(),
        candidates,
    })
}

/// Parse one table row; `None` if anything is missing or malformed.
fn parse_release_row(
    row: &ElementRef,
    cell_selector: &Selector,
    link_selector: &Selector,
) -> Option<RawCandidate> {
    let cells: Vec<ElementRef> = row.select(cell_selector).collect();

    let title = normalize_title(&cells.get(TITLE_CELL)?.text().collect::<String>());

    let href = cells
        .get(LINK_CELL)?
        .select(link_selector)
        .next()?
        .value()
        .attr("href")?;
    let download_token = download_token(href);

    let leechers = parse_count(cells.get(LEECHERS_CELL)?)?;
    let seeders = parse_count(cells.get(SEEDERS_CELL)?)?;

    Some(RawCandidate {
        title,
        download_token,
        seeders,
        leechers,
        size: None,
    })
}

fn parse_count(cell: &ElementRef) -> Option<u32> {
    cell.text().collect::<String>().trim().parse().ok()
}

/// Replace non-breaking spaces and dots with plain spaces.
pub fn normalize_title(text: &str) -> String {
    text.replace(['\u{a0}', '.'], " ").trim().to_string()
}

/// Last eight characters of a download href (the whole href if shorter).
pub fn download_token(href: &str) -> String {
    let len = href.chars().count();
    href.chars().skip(len.saturating_sub(TOKEN_LEN)).collect()
}
