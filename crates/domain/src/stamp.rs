use prcard_core::{AppError, AppResult};

/// Fraction of a text box height below its top edge where the baseline sits.
pub const BASELINE_RATIO: f64 = 0.75;

/// Fraction of the converted box height used as the font size.
pub const FONT_SCALE: f64 = 0.8;

/// Smallest stamp font size in points.
pub const MIN_FONT_SIZE_PT: f64 = 7.0;

/// Largest stamp font size in points.
pub const MAX_FONT_SIZE_PT: f64 = 12.0;

/// Page size in pixels as the browser rendered it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMeta {
    width: f64,
    height: f64,
}

impl PageMeta {
    /// Stand-in for stamps whose page was never declared.
    ///
    /// Scaling against a single pixel puts such stamps far outside the page.
    /// Callers are expected to declare every page they stamp.
    pub const UNDECLARED: Self = Self {
        width: 1.0,
        height: 1.0,
    };

    /// Creates a validated page size. Both dimensions must be finite and positive.
    pub fn new(width: f64, height: f64) -> AppResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(AppError::Validation(format!(
                "page size must be positive, got {width}x{height}"
            )));
        }

        Ok(Self { width, height })
    }
}

/// Page size in PDF points, taken from the page's media box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

/// Free text to draw on top of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct StampItem {
    page: usize,
    x_px: f64,
    y_px: f64,
    height_px: f64,
    text: String,
}

impl StampItem {
    /// Creates a stamp from the top-left corner and height of its box in pixels.
    pub fn new(
        page: usize,
        x_px: f64,
        y_px: f64,
        height_px: f64,
        text: impl Into<String>,
    ) -> AppResult<Self> {
        if !(x_px.is_finite() && y_px.is_finite() && height_px.is_finite()) {
            return Err(AppError::Validation(
                "stamp coordinates must be finite numbers".to_owned(),
            ));
        }

        Ok(Self {
            page,
            x_px,
            y_px,
            height_px,
            text: text.into(),
        })
    }

    /// Zero-based page index.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Text to draw.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-only stamps are never drawn.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Converts the pixel box into a text origin and font size on the page.
    #[must_use]
    pub fn placement(&self, declared: PageMeta, page: PageSize) -> StampPlacement {
        let x_pt = self.x_px / declared.width * page.width;
        let baseline_px = self.y_px + BASELINE_RATIO * self.height_px;
        let y_pt = page.height - baseline_px / declared.height * page.height;
        let font_size_pt = (FONT_SCALE * (self.height_px / declared.height) * page.height)
            .clamp(MIN_FONT_SIZE_PT, MAX_FONT_SIZE_PT);

        StampPlacement {
            x_pt,
            y_pt,
            font_size_pt,
        }
    }
}

/// Stamps to draw over a document together with the page sizes the browser
/// measured them against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StampOverlay {
    pages: Vec<PageMeta>,
    stamps: Vec<StampItem>,
}

impl StampOverlay {
    /// Creates an overlay. `pages[i]` describes page `i`.
    #[must_use]
    pub fn new(pages: Vec<PageMeta>, stamps: Vec<StampItem>) -> Self {
        Self { pages, stamps }
    }

    /// Declared size of a page, [`PageMeta::UNDECLARED`] when missing.
    #[must_use]
    pub fn declared_page(&self, index: usize) -> PageMeta {
        self.pages
            .get(index)
            .copied()
            .unwrap_or(PageMeta::UNDECLARED)
    }

    /// Stamps with visible text on the given page, in request order.
    pub fn stamps_on_page(&self, index: usize) -> impl Iterator<Item = &StampItem> {
        self.stamps
            .iter()
            .filter(move |stamp| stamp.page == index && !stamp.is_blank())
    }

    /// All stamps, including blank ones.
    #[must_use]
    pub fn stamps(&self) -> &[StampItem] {
        &self.stamps
    }
}

/// Where and how large a stamp is drawn, in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampPlacement {
    /// Text origin x.
    pub x_pt: f64,
    /// Baseline y, measured up from the bottom edge.
    pub y_pt: f64,
    /// Font size.
    pub font_size_pt: f64,
}
