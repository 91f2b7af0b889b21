//! Per-instrument detail page scraper.
//!
//! Every field has its own accessor on `DetailPage`; a layout change on the
//! site should only ever touch one of them. Accessors return `None` when their
//! anchor is missing and the record keeps the sentinel for that field.

use super::listing::{cell_text, selector};
use super::timestamp::{normalize_to_utc, TimezoneTable};
use crate::config::FuturesConfig;
use crate::domain::{DetailField, FuturesDetail, FuturesListing};
use crate::error::DataError;
use crate::http::PageFetcher;
use crate::pacing::Pacer;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

struct DetailSelectors {
    ticker: Selector,
    market: Selector,
    last: Selector,
    change: Selector,
    percent_change: Selector,
    label_or_primary: Selector,
    small: Selector,
    header_or_cell: Selector,
    th: Selector,
    volume_primary: Selector,
    volume_secondary: Selector,
    timestamp: Selector,
    performance_row: Selector,
    performance_period: Selector,
    performance_value: Selector,
}

impl DetailSelectors {
    fn new() -> Self {
        Self {
            ticker: selector("span.company__ticker"),
            market: selector("span.company__market"),
            last: selector("bg-quote[field='Last']"),
            change: selector("bg-quote[field='change']"),
            percent_change: selector("bg-quote[field='percentchange']"),
            label_or_primary: selector("small, span.primary"),
            small: selector("small"),
            header_or_cell: selector("th, td"),
            th: selector("th"),
            volume_primary: selector(".range--volume .primary"),
            volume_secondary: selector(".range--volume .secondary"),
            timestamp: selector("span.timestamp__time"),
            performance_row: selector("div.element.element--table.performance tr.table__row"),
            performance_period: selector("td.table__cell"),
            performance_value: selector("li.content__item.value.ignore-color"),
        }
    }
}

/// A parsed detail page with one accessor per field.
struct DetailPage<'s> {
    document: Html,
    sel: &'s DetailSelectors,
}

impl<'s> DetailPage<'s> {
    fn parse(html: &str, sel: &'s DetailSelectors) -> Self {
        Self {
            document: Html::parse_document(html),
            sel,
        }
    }

    fn first_text(&self, selector: &Selector) -> Option<String> {
        self.document.select(selector).next().map(|el| cell_text(&el))
    }

    /// Text of the first `value` element following the first `anchor` element
    /// (in document order) accepted by `is_anchor`. `pair` must match both.
    fn text_after(
        &self,
        pair: &Selector,
        anchor: &Selector,
        is_anchor: impl Fn(&str) -> bool,
    ) -> Option<String> {
        let mut seen_anchor = false;
        for el in self.document.select(pair) {
            if anchor.matches(&el) {
                if !seen_anchor && is_anchor(&cell_text(&el)) {
                    seen_anchor = true;
                }
            } else if seen_anchor {
                return Some(cell_text(&el));
            }
        }
        None
    }

    /// `span.primary` after the `<small>` whose text is exactly `label`.
    fn labelled_primary(&self, label: &str) -> Option<String> {
        self.text_after(&self.sel.label_or_primary, &self.sel.small, |t| t == label)
    }

    pub fn ticker(&self) -> Option<String> {
        let ticker = self.first_text(&self.sel.ticker)?;
        let market = self.first_text(&self.sel.market)?;
        Some(format!("{ticker} ({market})"))
    }

    pub fn price(&self) -> Option<String> {
        self.first_text(&self.sel.last)
    }

    pub fn change_points(&self) -> Option<String> {
        self.first_text(&self.sel.change)
    }

    pub fn change_percent(&self) -> Option<String> {
        self.first_text(&self.sel.percent_change)
    }

    pub fn open_price(&self) -> Option<String> {
        self.labelled_primary("Open")
    }

    pub fn open_interest(&self) -> Option<String> {
        self.labelled_primary("Open Interest")
    }

    pub fn day_range(&self) -> Option<String> {
        self.labelled_primary("Day Range")
    }

    pub fn week_range_52(&self) -> Option<String> {
        self.labelled_primary("52 Week Range")
    }

    pub fn settlement_price(&self) -> Option<String> {
        self.text_after(&self.sel.header_or_cell, &self.sel.th, |t| {
            t.contains("Settlement Price")
        })
    }

    pub fn volume(&self) -> Option<String> {
        self.first_text(&self.sel.volume_primary)
    }

    pub fn average_volume_65_day(&self) -> Option<String> {
        self.first_text(&self.sel.volume_secondary)
    }

    /// Raw "last updated" text with its label stripped; not yet normalised.
    pub fn last_updated_raw(&self) -> Option<String> {
        self.first_text(&self.sel.timestamp)
            .map(|t| t.replace("Last Updated: ", "").trim().to_string())
    }

    /// `(period, value)` rows of the performance table, in page order.
    pub fn performance(&self) -> Vec<(String, String)> {
        self.document
            .select(&self.sel.performance_row)
            .filter_map(|row| {
                let period = first_in(&row, &self.sel.performance_period)?;
                let value = first_in(&row, &self.sel.performance_value)?;
                Some((period, value))
            })
            .collect()
    }
}

fn first_in(el: &ElementRef, selector: &Selector) -> Option<String> {
    el.select(selector).next().map(|e| cell_text(&e))
}

/// Build a record from a parsed page. Fields whose accessor finds nothing
/// keep the sentinel.
fn extract_detail(page: &DetailPage, timezones: &TimezoneTable) -> FuturesDetail {
    let mut detail = FuturesDetail::new();

    let fields = [
        (DetailField::Ticker, page.ticker()),
        (DetailField::Price, page.price()),
        (DetailField::ChangePoints, page.change_points()),
        (DetailField::ChangePercent, page.change_percent()),
        (DetailField::OpenPrice, page.open_price()),
        (DetailField::OpenInterest, page.open_interest()),
        (DetailField::SettlementPrice, page.settlement_price()),
        (DetailField::DayRange, page.day_range()),
        (DetailField::WeekRange52, page.week_range_52()),
        (DetailField::Volume, page.volume()),
        (DetailField::AvgVolume65Day, page.average_volume_65_day()),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            detail.set(field, value);
        }
    }

    if let Some(raw) = page.last_updated_raw() {
        detail.set(DetailField::LastUpdated, normalize_to_utc(&raw, timezones));
    }

    for (period, value) in page.performance() {
        if let Some(field) = DetailField::from_performance_period(&period) {
            detail.set(field, value);
        }
    }

    detail
}

pub struct DetailScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    pacer: &'a dyn Pacer,
    timezones: TimezoneTable,
    selectors: DetailSelectors,
}

impl<'a> DetailScraper<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        pacer: &'a dyn Pacer,
        config: &FuturesConfig,
    ) -> Result<Self, DataError> {
        Ok(Self {
            fetcher,
            pacer,
            timezones: TimezoneTable::from_names(&config.timezones)?,
            selectors: DetailSelectors::new(),
        })
    }

    /// Extract a record from page HTML, named after the listing.
    pub fn parse(&self, html: &str, name: &str) -> FuturesDetail {
        let page = DetailPage::parse(html, &self.selectors);
        let mut detail = extract_detail(&page, &self.timezones);
        detail.set(DetailField::FuturesName, name);
        detail
    }

    /// Fetch and parse each listing's detail page once. Pages that fail to
    /// load are left out of the result.
    pub fn scrape(&self, listings: &[FuturesListing]) -> Vec<FuturesDetail> {
        let mut details = Vec::with_capacity(listings.len());

        for listing in listings {
            if listing.link.is_empty() {
                warn!(name = %listing.name, "listing has no detail link, skipping");
                continue;
            }

            info!(url = %listing.link, "scraping detail page");
            match self.fetcher.fetch(&listing.link) {
                Ok(html) => details.push(self.parse(&html, &listing.name)),
                Err(e) => warn!(url = %listing.link, error = %e, "failed to fetch detail page"),
            }

            self.pacer.between_requests();
        }

        info!(count = details.len(), "futures details scraped");
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NOT_AVAILABLE;
    use crate::pacing::NoDelay;
    use std::collections::HashMap;

    const PAGE: &str = r#"
        <html><body>
          <div class="company">
            <span class="company__ticker">CL00</span>
            <span class="company__market">NYMEX</span>
          </div>
          <h2 class="intraday__price"><bg-quote field="Last">68.42</bg-quote></h2>
          <bg-quote field="change">-0.37</bg-quote>
          <bg-quote field="percentchange">-0.54%</bg-quote>
          <span class="timestamp__time">Last Updated: <bg-quote field="date">Mar 3, 2025 10:15 a.m. EST</bg-quote></span>
          <ul class="list list--kv">
            <li class="kv__item"><small class="label">Open</small><span class="primary">68.80</span></li>
            <li class="kv__item"><small class="label">Day Range</small><span class="primary">68.10 - 69.02</span></li>
            <li class="kv__item"><small class="label">52 Week Range</small><span class="primary">63.73 - 87.67</span></li>
          </ul>
          <div class="range range--volume">
            <span class="primary">233,160</span><span class="secondary">65 Day Avg: 281,420</span>
          </div>
          <table><tr><th>Settlement Price <small>03/02/25</small></th><td>68.79</td></tr></table>
          <div class="element element--table performance">
            <table>
              <tr class="table__row"><td class="table__cell">5 Day</td><td><ul><li class="content__item value ignore-color">-2.15%</li></ul></td></tr>
              <tr class="table__row"><td class="table__cell">YTD</td><td><ul><li class="content__item value ignore-color">-4.60%</li></ul></td></tr>
              <tr class="table__row"><td class="table__cell">10 Year</td><td><ul><li class="content__item value ignore-color">31.00%</li></ul></td></tr>
            </table>
          </div>
        </body></html>"#;

    fn detail_scraper<'a>(fetcher: &'a dyn PageFetcher, cfg: &FuturesConfig) -> DetailScraper<'a> {
        DetailScraper::new(fetcher, &NoDelay, cfg).unwrap()
    }

    struct Pages(HashMap<String, String>);

    impl PageFetcher for Pages {
        fn fetch(&self, url: &str) -> Result<String, DataError> {
            self.0.get(url).cloned().ok_or(DataError::HttpStatus {
                status: 404,
                url: url.into(),
            })
        }
    }

    fn listing(name: &str, link: &str) -> FuturesListing {
        FuturesListing {
            page: 1,
            name: name.into(),
            link: link.into(),
            exchange: "NYMEX".into(),
            country: "United States".into(),
            sector: String::new(),
        }
    }

    #[test]
    fn extracts_every_present_field() {
        let cfg = FuturesConfig::default();
        let pages = Pages(HashMap::new());
        let detail = detail_scraper(&pages, &cfg).parse(PAGE, "Crude Oil");

        assert_eq!(detail.get(DetailField::FuturesName), "Crude Oil");
        assert_eq!(detail.get(DetailField::Ticker), "CL00 (NYMEX)");
        assert_eq!(detail.get(DetailField::Price), "68.42");
        assert_eq!(detail.get(DetailField::ChangePoints), "-0.37");
        assert_eq!(detail.get(DetailField::ChangePercent), "-0.54%");
        assert_eq!(detail.get(DetailField::OpenPrice), "68.80");
        assert_eq!(detail.get(DetailField::DayRange), "68.10 - 69.02");
        assert_eq!(detail.get(DetailField::WeekRange52), "63.73 - 87.67");
        assert_eq!(detail.get(DetailField::Volume), "233,160");
        assert_eq!(detail.get(DetailField::AvgVolume65Day), "65 Day Avg: 281,420");
        assert_eq!(detail.get(DetailField::SettlementPrice), "68.79");
        assert_eq!(
            detail.get(DetailField::LastUpdated),
            "2025-03-03T15:15:00.000000Z"
        );
        assert_eq!(detail.get(DetailField::Performance5Day), "-2.15%");
        assert_eq!(detail.get(DetailField::PerformanceYtd), "-4.60%");
    }

    #[test]
    fn missing_open_interest_is_sentinel_only_for_that_field() {
        let cfg = FuturesConfig::default();
        let pages = Pages(HashMap::new());
        let detail = detail_scraper(&pages, &cfg).parse(PAGE, "Crude Oil");

        assert_eq!(detail.get(DetailField::OpenInterest), NOT_AVAILABLE);
        assert_eq!(detail.get(DetailField::Performance1Month), NOT_AVAILABLE);
        assert_eq!(detail.get(DetailField::Price), "68.42");
    }

    #[test]
    fn open_label_does_not_match_open_interest() {
        let cfg = FuturesConfig::default();
        let pages = Pages(HashMap::new());
        let html = r#"<ul>
            <li><small>Open Interest</small><span class="primary">1,234</span></li>
            <li><small>Open</small><span class="primary">70.01</span></li>
        </ul>"#;
        let detail = detail_scraper(&pages, &cfg).parse(html, "X");

        assert_eq!(detail.get(DetailField::OpenInterest), "1,234");
        assert_eq!(detail.get(DetailField::OpenPrice), "70.01");
    }

    #[test]
    fn blank_page_is_all_sentinel_except_name() {
        let cfg = FuturesConfig::default();
        let pages = Pages(HashMap::new());
        let detail = detail_scraper(&pages, &cfg).parse("<html></html>", "Empty");

        assert_eq!(detail.extracted_count(), 1);
        assert_eq!(detail.get(DetailField::LastUpdated), NOT_AVAILABLE);
    }

    #[test]
    fn failed_pages_are_omitted() {
        let cfg = FuturesConfig::default();
        let mut map = HashMap::new();
        map.insert("https://example.test/a".to_string(), PAGE.to_string());
        let pages = Pages(map);

        let details = detail_scraper(&pages, &cfg).scrape(&[
            listing("A", "https://example.test/a"),
            listing("B", "https://example.test/missing"),
            listing("C", ""),
        ]);

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].get(DetailField::FuturesName), "A");
    }
}
