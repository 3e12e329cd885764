//! Page-number pagination shared by every post listing.
//!
//! Requests come straight from the `?page=` query parameter and never fail:
//! unparsable input resolves to the first page, out-of-range numbers clamp to
//! the nearest valid page.

use serde::Serialize;
use url::form_urlencoded;

/// Fixed page size for every post listing.
pub const POSTS_PER_PAGE: u32 = 10;

/// Raw page selection as supplied by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    requested: Option<i64>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self { requested: Some(1) }
    }

    pub fn number(number: i64) -> Self {
        Self {
            requested: Some(number),
        }
    }

    /// Interpret the raw `page` query value. Anything that is not an integer
    /// is treated as a request for the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        let requested = raw.and_then(|value| value.trim().parse::<i64>().ok());
        Self { requested }
    }

    /// Pick the page out of a whole query string. A repeated `page` key
    /// resolves to its last value; other keys are ignored.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let page = query.and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .filter(|(key, _)| key == "page")
                .map(|(_, value)| value.into_owned())
                .last()
        });
        Self::from_query(page.as_deref())
    }
}

/// Offset/limit pair for a resolved page, handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub offset: u64,
    pub limit: u32,
}

/// Computes page boundaries for a collection of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u32,
}

impl Paginator {
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn for_posts(total: u64) -> Self {
        Self::new(total, POSTS_PER_PAGE)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of pages; an empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        if self.total == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Clamp the request into `1..=num_pages`.
    pub fn resolve(&self, request: PageRequest) -> PageWindow {
        let last = i64::from(self.num_pages());
        let number = match request.requested {
            Some(value) => value.clamp(1, last),
            None => 1,
        };
        // `number` lies in 1..=u32::MAX after clamping.
        let number = u32::try_from(number).unwrap_or(1);

        PageWindow {
            number,
            offset: u64::from(number - 1) * u64::from(self.per_page),
            limit: self.per_page,
        }
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, paginator: &Paginator) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: paginator.num_pages(),
            total: paginator.total(),
            per_page: paginator.per_page(),
        }
    }

    pub fn empty() -> Self {
        let paginator = Paginator::for_posts(0);
        Self::new(Vec::new(), paginator.resolve(PageRequest::first()), &paginator)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page (0 when empty).
    pub fn start_index(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        u64::from(self.number - 1) * u64::from(self.per_page) + 1
    }

    pub fn page_range(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.num_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
        }
    }
}

/// Slice an in-memory ordered collection into the requested page.
pub fn paginate<T>(items: Vec<T>, per_page: u32, request: PageRequest) -> Page<T> {
    let paginator = Paginator::new(items.len() as u64, per_page);
    let window = paginator.resolve(request);
    let start = usize::try_from(window.offset).unwrap_or(usize::MAX);
    let page_items = items
        .into_iter()
        .skip(start)
        .take(window.limit as usize)
        .collect();
    Page::new(page_items, window, &paginator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_into_ten_and_three() {
        let items: Vec<u32> = (0..13).collect();

        let first = paginate(items.clone(), POSTS_PER_PAGE, PageRequest::first());
        assert_eq!(first.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = paginate(items, POSTS_PER_PAGE, PageRequest::number(2));
        assert_eq!(second.items, vec![10, 11, 12]);
        assert!(!second.has_next());
        assert_eq!(second.previous_page_number(), Some(1));
        assert_eq!(second.start_index(), 11);
    }

    #[test]
    fn page_size_larger_than_collection_yields_single_page() {
        for total in 0..25u32 {
            let items: Vec<u32> = (0..total).collect();
            let page = paginate(items.clone(), total + 1, PageRequest::first());
            assert_eq!(page.num_pages, 1);
            assert_eq!(page.items, items);
            assert!(!page.has_other_pages());
        }
    }

    #[test]
    fn out_of_range_pages_clamp_to_nearest_valid_page() {
        let paginator = Paginator::for_posts(25);

        assert_eq!(paginator.resolve(PageRequest::number(99)).number, 3);
        assert_eq!(paginator.resolve(PageRequest::number(0)).number, 1);
        assert_eq!(paginator.resolve(PageRequest::number(-4)).number, 1);
    }

    #[test]
    fn garbage_page_values_resolve_to_first_page() {
        let paginator = Paginator::for_posts(25);

        for raw in ["abc", "", "2.5", "1e3"] {
            let window = paginator.resolve(PageRequest::from_query(Some(raw)));
            assert_eq!(window.number, 1, "raw value {raw:?}");
        }
        assert_eq!(paginator.resolve(PageRequest::from_query(None)).number, 1);
        assert_eq!(
            paginator.resolve(PageRequest::from_query(Some(" 3 "))).number,
            3
        );
    }

    #[test]
    fn query_string_takes_last_page_value() {
        let paginator = Paginator::for_posts(25);
        let resolve = |query: Option<&str>| {
            paginator
                .resolve(PageRequest::from_query_string(query))
                .number
        };

        assert_eq!(resolve(Some("page=1&page=2")), 2);
        assert_eq!(resolve(Some("sort=new&page=3")), 3);
        assert_eq!(resolve(Some("page=2&page=oops")), 1);
        assert_eq!(resolve(Some("page")), 1);
        assert_eq!(resolve(Some("%zz=&&page=%32")), 2);
        assert_eq!(resolve(None), 1);
    }

    #[test]
    fn window_offsets_follow_page_number() {
        let paginator = Paginator::for_posts(35);
        let window = paginator.resolve(PageRequest::number(3));

        assert_eq!(window.offset, 20);
        assert_eq!(window.limit, POSTS_PER_PAGE);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let page: Page<u8> = Page::empty();

        assert_eq!(page.num_pages, 1);
        assert_eq!(page.number, 1);
        assert!(page.is_empty());
        assert_eq!(page.start_index(), 0);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let paginator = Paginator::new(3, 0);
        assert_eq!(paginator.per_page(), 1);
        assert_eq!(paginator.num_pages(), 3);
    }
}
