use crate::client::{CatalogSource, ClientError};
use crate::models::Product;
use crate::render;
use crate::view::{CountLabel, Region, View};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Snapshot order.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "default" | "none" => Some(Self::Default),
            "price-asc" | "price_asc" => Some(Self::PriceAsc),
            "price-desc" | "price_desc" => Some(Self::PriceDesc),
            "title-asc" | "title_asc" | "name-asc" => Some(Self::TitleAsc),
            "title-desc" | "title_desc" | "name-desc" => Some(Self::TitleDesc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::TitleAsc => "title-asc",
            SortKey::TitleDesc => "title-desc",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageControl {
    /// Target page, or None when already on the first page.
    Previous(Option<usize>),
    Page { number: usize, current: bool },
    Ellipsis,
    /// Target page, or None when already on the last page.
    Next(Option<usize>),
}

/// Truncated pagination: first, last, current and its neighbours, with an
/// ellipsis in every gap. Nothing is produced for a single page.
pub fn page_controls(current: usize, total: usize) -> Vec<PageControl> {
    if total <= 1 {
        return Vec::new();
    }
    let mut out = vec![PageControl::Previous(if current > 1 {
        Some(current - 1)
    } else {
        None
    })];
    let mut last_shown = 0;
    for number in 1..=total {
        let visible = number == 1 || number == total || number.abs_diff(current) <= 1;
        if !visible {
            continue;
        }
        if last_shown != 0 && number - last_shown > 1 {
            out.push(PageControl::Ellipsis);
        }
        out.push(PageControl::Page {
            number,
            current: number == current,
        });
        last_shown = number;
    }
    out.push(PageControl::Next(if current < total {
        Some(current + 1)
    } else {
        None
    }));
    out
}

/// Search, sort and pagination state layered over a product mirror. The
/// projection holds indices into the mirror and never mutates it.
#[derive(Clone, Debug)]
pub struct CatalogController {
    products: Vec<Product>,
    projection: Vec<usize>,
    search: String,
    sort: SortKey,
    page_size: usize,
    page: usize,
}

impl Default for CatalogController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CatalogController {
    pub fn new(page_size: usize) -> Self {
        Self {
            products: Vec::new(),
            projection: Vec::new(),
            search: String::new(),
            sort: SortKey::Default,
            page_size: page_size.max(1),
            page: 1,
        }
    }

    /// Swaps in a fresh snapshot and rebuilds the projection with the
    /// current search, in snapshot order.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
        self.page = 1;
        self.refilter();
    }

    pub async fn reload(&mut self, source: &CatalogSource) -> Result<usize, ClientError> {
        let products = source.fetch().await?;
        let count = products.len();
        self.replace(products);
        log::debug!("reloaded catalog from {} ({} products)", source.url(), count);
        Ok(count)
    }

    /// Case-insensitive title match, always computed from the full mirror.
    /// The new projection is in mirror order until the next `apply_sort`,
    /// and the page goes back to 1.
    pub fn apply_filter(&mut self, term: &str) {
        self.search = term.trim().to_string();
        self.page = 1;
        self.refilter();
    }

    /// Stable sort of the current projection only. Page is kept.
    pub fn apply_sort(&mut self, key: SortKey) {
        self.sort = key;
        self.sort_projection();
    }

    /// Rejects 0. Any accepted change resets to page 1.
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if size == 0 {
            return false;
        }
        self.page_size = size;
        self.page = 1;
        true
    }

    /// Out-of-range requests are ignored and leave the current page as is.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages() {
            return false;
        }
        self.page = page;
        true
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Last selected key. A later filter does not re-apply it.
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn mirror_len(&self) -> usize {
        self.products.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.projection.len()
    }

    pub fn total_pages(&self) -> usize {
        self.projection.len().div_ceil(self.page_size)
    }

    pub fn filtered(&self) -> Vec<&Product> {
        self.projection.iter().map(|&i| &self.products[i]).collect()
    }

    pub fn page_items(&self) -> Vec<&Product> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        self.projection
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.products[i])
            .collect()
    }

    pub fn controls(&self) -> Vec<PageControl> {
        page_controls(self.page, self.total_pages())
    }

    pub fn show<V: View + ?Sized>(&self, view: &mut V) {
        view.show(Region::ProductGrid, render::render_products(&self.page_items()));
        view.show(Region::Pagination, render::render_pagination(&self.controls()));
        view.set_count(CountLabel::Products, self.filtered_len());
    }

    fn refilter(&mut self) {
        let needle = self.search.to_lowercase();
        self.projection = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
    }

    fn sort_projection(&mut self) {
        let products = &self.products;
        let by_title = |a: &usize, b: &usize| {
            products[*a]
                .title
                .to_lowercase()
                .cmp(&products[*b].title.to_lowercase())
        };
        let by_price =
            |a: &usize, b: &usize| products[*a].price.total_cmp(&products[*b].price);
        match self.sort {
            SortKey::Default => self.projection.sort(),
            SortKey::PriceAsc => self.projection.sort_by(by_price),
            SortKey::PriceDesc => self.projection.sort_by(|a, b| by_price(b, a)),
            SortKey::TitleAsc => self.projection.sort_by(by_title),
            SortKey::TitleDesc => self.projection.sort_by(|a, b| by_title(b, a)),
        }
    }
}
