//! Backend-independent page layout for reports.
//!
//! Content is laid out top-down on A4 pages in PDF points. When a line does
//! not fit above the footer band a new page is opened, and the page-added
//! hook stamps it before any content lands on it.

use std::sync::Arc;

// ---

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

/// Content never goes below this line; the footer lives underneath.
const CONTENT_BOTTOM: f32 = MARGIN + 30.0;
pub const FOOTER_Y: f32 = MARGIN - 15.0;

const LINE_SPACING: f32 = 1.4;
pub const BODY_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Muted,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f32,
    /// Baseline, measured from the bottom edge.
    pub y: f32,
    pub size: f32,
    pub tone: Tone,
    pub text: String,
}

/// PNG placed by its top-left corner; height follows the image aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    pub x: f32,
    /// Top edge, measured from the bottom edge of the page.
    pub top: f32,
    pub width: f32,
    pub png: Arc<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub items: Vec<TextItem>,
    /// Horizontal rules as (y, x_from, x_to).
    pub rules: Vec<(f32, f32, f32)>,
    pub images: Vec<ImageItem>,
}

impl Page {
    pub fn text(&mut self, x: f32, y: f32, size: f32, tone: Tone, text: impl Into<String>) {
        self.items.push(TextItem {
            x,
            y,
            size,
            tone,
            text: text.into(),
        });
    }
}

type PageHook = Box<dyn Fn(&mut Page) + Send + Sync>;

pub struct ReportDocument {
    title: String,
    pages: Vec<Page>,
    cursor: f32,
    on_page_added: PageHook,
}

impl ReportDocument {
    /// Start a document; `on_page_added` runs for every page, the first included.
    pub fn new(title: impl Into<String>, on_page_added: PageHook) -> Self {
        // ---
        let mut doc = Self {
            title: title.into(),
            pages: Vec::new(),
            cursor: 0.0,
            on_page_added,
        };
        doc.add_page();
        doc
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn add_page(&mut self) {
        // ---
        let mut page = Page {
            number: self.pages.len() + 1,
            items: Vec::new(),
            rules: Vec::new(),
            images: Vec::new(),
        };
        (self.on_page_added)(&mut page);
        self.pages.push(page);
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    /// Emit one line at the left margin, breaking the page if needed.
    pub fn line(&mut self, size: f32, tone: Tone, text: impl Into<String>) {
        self.line_at(MARGIN, size, tone, text);
    }

    /// Emit one line starting at `x`, breaking the page if needed.
    pub fn line_at(&mut self, x: f32, size: f32, tone: Tone, text: impl Into<String>) {
        // ---
        let advance = size * LINE_SPACING;
        if self.cursor - advance < CONTENT_BOTTOM {
            self.add_page();
        }
        self.cursor -= advance;
        let y = self.cursor;
        self.current().text(x, y, size, tone, text);
    }

    /// Place a PNG on the current page without moving the cursor.
    pub fn image(&mut self, x: f32, top: f32, width: f32, png: Arc<Vec<u8>>) {
        self.current().images.push(ImageItem { x, top, width, png });
    }

    /// Move the cursor down to at least `y`.
    pub fn skip_below(&mut self, y: f32) {
        self.cursor = self.cursor.min(y).max(CONTENT_BOTTOM);
    }

    pub fn text(&mut self, text: impl Into<String>) {
        self.line(BODY_SIZE, Tone::Normal, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.line(BODY_SIZE, Tone::Warning, text);
    }

    /// Vertical space of `lines` body lines; never opens a page by itself.
    pub fn gap(&mut self, lines: f32) {
        self.cursor = (self.cursor - lines * BODY_SIZE * LINE_SPACING).max(CONTENT_BOTTOM);
    }

    /// Full-width horizontal rule at the cursor.
    pub fn rule(&mut self) {
        // ---
        self.cursor -= BODY_SIZE * 0.5;
        let y = self.cursor;
        self.current().rules.push((y, MARGIN, PAGE_WIDTH - MARGIN));
        self.cursor -= BODY_SIZE * 0.5;
    }

    fn current(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// All texts in emission order, footers included.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.items.iter().map(|i| i.text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn numbered_footer() -> PageHook {
        Box::new(|page: &mut Page| {
            let label = format!("Page {}", page.number);
            page.text(MARGIN, FOOTER_Y, 9.0, Tone::Muted, label);
        })
    }

    #[test]
    fn test_first_page_gets_footer() {
        // ---
        let doc = ReportDocument::new("t", numbered_footer());
        assert_eq!(doc.pages().len(), 1);
        assert_eq!(doc.texts().collect::<Vec<_>>(), ["Page 1"]);
    }

    #[test]
    fn test_long_content_breaks_pages() {
        // ---
        let mut doc = ReportDocument::new("t", numbered_footer());
        for i in 0..200 {
            doc.text(format!("row {i}"));
        }

        let pages = doc.pages();
        assert!(pages.len() > 1);
        for page in pages {
            let footer = format!("Page {}", page.number);
            assert_eq!(page.items.iter().filter(|i| i.text == footer).count(), 1);
            for item in page.items.iter().filter(|i| i.tone == Tone::Normal) {
                assert!(item.y >= CONTENT_BOTTOM && item.y <= PAGE_HEIGHT - MARGIN);
            }
        }
        assert_eq!(doc.texts().filter(|t| t.starts_with("row ")).count(), 200);
    }

    #[test]
    fn test_gap_does_not_overflow_page() {
        // ---
        let mut doc = ReportDocument::new("t", numbered_footer());
        doc.gap(1000.0);
        doc.text("after gap");

        assert_eq!(doc.pages().len(), 2);
        assert_eq!(doc.pages()[1].items.last().unwrap().text, "after gap");
    }

    #[test]
    fn test_image_stays_on_current_page() {
        // ---
        let mut doc = ReportDocument::new("t", numbered_footer());
        let png = Arc::new(vec![1u8, 2, 3]);
        doc.image(MARGIN, PAGE_HEIGHT - 40.0, 80.0, png.clone());
        doc.line_at(150.0, 16.0, Tone::Normal, "brand");
        doc.skip_below(PAGE_HEIGHT - 130.0);
        doc.text("body");

        let page = &doc.pages()[0];
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.images[0].png, png);

        let brand = page.items.iter().find(|i| i.text == "brand").unwrap();
        let body = page.items.iter().find(|i| i.text == "body").unwrap();
        assert_eq!(brand.x, 150.0);
        assert_eq!(body.x, MARGIN);
        assert!(body.y < PAGE_HEIGHT - 130.0);
    }
}
