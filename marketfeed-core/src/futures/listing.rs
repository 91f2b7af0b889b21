//! Futures listing table scraper.
//!
//! Walks the paginated listing, parses `table.table-condensed` on each page
//! and returns the deduplicated rows ordered by (page, name).

use crate::config::FuturesConfig;
use crate::domain::FuturesListing;
use crate::http::PageFetcher;
use crate::pacing::Pacer;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info};

pub struct ListScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    pacer: &'a dyn Pacer,
    config: &'a FuturesConfig,
    selectors: ListSelectors,
}

struct ListSelectors {
    table: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
}

impl ListSelectors {
    fn new() -> Self {
        Self {
            table: selector("table.table.table-condensed"),
            row: selector("tbody tr"),
            cell: selector("td"),
            link: selector("a[href]"),
        }
    }
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

impl<'a> ListScraper<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        pacer: &'a dyn Pacer,
        config: &'a FuturesConfig,
    ) -> Self {
        Self {
            fetcher,
            pacer,
            config,
            selectors: ListSelectors::new(),
        }
    }

    /// Scrape every listing page.
    pub fn scrape_all(&self) -> Vec<FuturesListing> {
        let total = self.config.total_pages;
        let mut rows = Vec::new();

        for page in 1..=total {
            let url = self.config.page_url(page);
            info!(page, total, %url, "scraping listing page");

            if let Some(html) = self.fetch_with_retry(&url) {
                rows.extend(self.parse_page(&html, page));
            }

            self.pacer.between_requests();
        }

        let rows = dedup_sorted(rows);
        info!(count = rows.len(), "unique futures listings");
        rows
    }

    /// Up to `max_attempts` tries; any error (status or transport) retries.
    fn fetch_with_retry(&self, url: &str) -> Option<String> {
        let attempts = self.config.max_attempts;

        for attempt in 1..=attempts {
            match self.fetcher.fetch(url) {
                Ok(body) => return Some(body),
                Err(e) => {
                    info!(attempt, %url, error = %e, "failed to fetch page");
                    if attempt < attempts {
                        self.pacer.before_retry(attempt);
                    }
                }
            }
        }

        error!(%url, attempts, "skipping page after failed attempts");
        None
    }

    /// Extract rows from one page's HTML.
    pub fn parse_page(&self, html: &str, page: u32) -> Vec<FuturesListing> {
        let document = Html::parse_document(html);
        let Some(table) = document.select(&self.selectors.table).next() else {
            error!(page, "listing table not found, the page structure may have changed");
            return Vec::new();
        };

        let mut rows = Vec::new();
        for row in table.select(&self.selectors.row) {
            let cells: Vec<ElementRef> = row.select(&self.selectors.cell).collect();
            if cells.is_empty() {
                continue;
            }
            match self.parse_row(&cells, page) {
                Ok(listing) => rows.push(listing),
                Err(reason) => error!(page, %reason, "failed to extract row"),
            }
        }
        rows
    }

    fn parse_row(&self, cells: &[ElementRef], page: u32) -> Result<FuturesListing, String> {
        if cells.len() < 3 {
            return Err(format!("expected at least 3 cells, found {}", cells.len()));
        }

        let href = cells[0]
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or("");

        Ok(FuturesListing {
            page,
            name: cell_text(&cells[0]),
            link: absolute_link(&self.config.site_root, href),
            exchange: cell_text(&cells[1]),
            country: cell_text(&cells[2]),
            sector: cells.get(3).map(cell_text).unwrap_or_default(),
        })
    }
}

pub(crate) fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn absolute_link(site_root: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{href}", site_root.trim_end_matches('/'))
    } else {
        href.to_string()
    }
}

/// Drop exact duplicates and order by (page, name).
pub fn dedup_sorted(mut rows: Vec<FuturesListing>) -> Vec<FuturesListing> {
    rows.sort();
    rows.dedup();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::pacing::NoDelay;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const PAGE: &str = r#"
        <html><body>
        <table class="table table-condensed">
          <thead><tr><th>Name</th><th>Exchange</th><th>Country</th><th>Sector</th></tr></thead>
          <tbody>
            <tr><td><a href="/investing/future/cl00">Crude Oil Continuous Contract<small>(CL00)</small></a></td>
                <td>NYMEX</td><td>United States</td><td>Energy</td></tr>
            <tr><td><a href="https://www.marketwatch.com/investing/future/gc00">Gold Continuous Contract</a></td>
                <td>COMEX</td><td>United States</td></tr>
            <tr><td>Broken row</td><td>CBOT</td></tr>
            <tr><td>Aluminum</td><td>LME</td><td>United Kingdom</td><td>Metals</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    struct FakeSite {
        pages: HashMap<String, String>,
        failures_before_success: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn new(pages: &[(String, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.clone(), b.to_string()))
                    .collect(),
                failures_before_success: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for FakeSite {
        fn fetch(&self, url: &str) -> Result<String, DataError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(left) = self.failures_before_success.lock().unwrap().get_mut(url) {
                if *left > 0 {
                    *left -= 1;
                    return Err(DataError::HttpStatus {
                        status: 403,
                        url: url.into(),
                    });
                }
            }
            self.pages.get(url).cloned().ok_or(DataError::HttpStatus {
                status: 404,
                url: url.into(),
            })
        }
    }

    fn config(total_pages: u32) -> FuturesConfig {
        FuturesConfig {
            total_pages,
            ..FuturesConfig::default()
        }
    }

    #[test]
    fn parses_rows_and_skips_short_ones() {
        let cfg = config(1);
        let site = FakeSite::new(&[]);
        let scraper = ListScraper::new(&site, &NoDelay, &cfg);

        let rows = scraper.parse_page(PAGE, 1);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "Crude Oil Continuous Contract(CL00)");
        assert_eq!(
            rows[0].link,
            "https://www.marketwatch.com/investing/future/cl00"
        );
        assert_eq!(rows[0].sector, "Energy");
        assert_eq!(rows[1].sector, "");
        assert_eq!(rows[1].exchange, "COMEX");
        assert_eq!(rows[2].link, "");
    }

    #[test]
    fn missing_table_yields_no_rows() {
        let cfg = config(1);
        let site = FakeSite::new(&[]);
        let scraper = ListScraper::new(&site, &NoDelay, &cfg);
        assert!(scraper
            .parse_page("<html><body><p>Access denied</p></body></html>", 1)
            .is_empty());
    }

    #[test]
    fn duplicates_across_passes_collapse() {
        let cfg = config(2);
        let site = FakeSite::new(&[(cfg.page_url(1), PAGE), (cfg.page_url(2), PAGE)]);
        let scraper = ListScraper::new(&site, &NoDelay, &cfg);

        let first = scraper.parse_page(PAGE, 1);
        let again = scraper.parse_page(PAGE, 1);
        let merged = dedup_sorted(first.iter().cloned().chain(again).collect());
        assert_eq!(merged.len(), first.len());

        // Same rows on a different page are distinct rows.
        let all = scraper.scrape_all();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| (w[0].page, &w[0].name) <= (w[1].page, &w[1].name)));
        assert_eq!(all[0].name, "Aluminum");
    }

    #[test]
    fn retries_then_gives_up_on_a_page() {
        let cfg = config(2);
        let site = FakeSite::new(&[(cfg.page_url(1), PAGE)]);
        let scraper = ListScraper::new(&site, &NoDelay, &cfg);

        let rows = scraper.scrape_all();

        let calls = site.calls.lock().unwrap();
        assert_eq!(calls.len(), 1 + 3);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.page == 1));
    }

    #[test]
    fn transient_failure_recovers_within_attempts() {
        let cfg = config(1);
        let site = FakeSite::new(&[(cfg.page_url(1), PAGE)]);
        site.failures_before_success
            .lock()
            .unwrap()
            .insert(cfg.page_url(1), 2);
        let scraper = ListScraper::new(&site, &NoDelay, &cfg);

        let rows = scraper.scrape_all();

        assert_eq!(site.calls.lock().unwrap().len(), 3);
        assert_eq!(rows.len(), 3);
    }
}
