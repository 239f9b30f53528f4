//! Pagination options and page geometry.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Layout units per inch (CSS pixels).
pub const UNITS_PER_INCH: f32 = 96.0;

/// Default usable content height: 9 inches at 96 units/inch.
pub const DEFAULT_NOMINAL_HEIGHT: f32 = 864.0;

/// Default quiet period between a document change and the measurement pass.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Default delay before the first pass after mounting.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Options controlling pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Maximum content height of a page in layout units
    pub nominal_height: f32,

    /// Debounce window after a document change, in milliseconds
    pub debounce_ms: u64,

    /// Delay before the first pass after mount, in milliseconds
    pub initial_delay_ms: u64,

    /// Page numbering scheme
    pub numbering: PageNumbering,
}

impl PaginationOptions {
    /// Create new pagination options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the nominal height from a paper size and its vertical margins.
    pub fn for_page(size: PageSize, vertical_margin_in: f32) -> Self {
        Self::default().with_nominal_height(size.content_height(vertical_margin_in))
    }

    /// Set the nominal content height.
    pub fn with_nominal_height(mut self, height: f32) -> Self {
        self.nominal_height = height.max(1.0);
        self
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Set the delay before the first pass after mount.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the page numbering scheme.
    pub fn with_numbering(mut self, numbering: PageNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// Debounce window as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Initial delay as a duration.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Load options from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            nominal_height: DEFAULT_NOMINAL_HEIGHT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            numbering: PageNumbering::default(),
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// US Letter (8.5 x 11 inches)
    Letter,
    /// US Legal (8.5 x 14 inches)
    Legal,
    /// ISO A4 (210 x 297 mm)
    A4,
    /// Custom paper height in inches
    Custom {
        /// Paper height in inches
        height_in: f32,
    },
}

impl PageSize {
    /// Paper height in inches.
    pub fn height_in(&self) -> f32 {
        match self {
            PageSize::Letter => 11.0,
            PageSize::Legal => 14.0,
            PageSize::A4 => 297.0 / 25.4,
            PageSize::Custom { height_in } => *height_in,
        }
    }

    /// Usable content height in layout units after top and bottom margins.
    pub fn content_height(&self, vertical_margin_in: f32) -> f32 {
        ((self.height_in() - 2.0 * vertical_margin_in) * UNITS_PER_INCH).max(1.0)
    }
}

/// Which pages carry a page number.
///
/// The leading pages (cover, table of contents) are unnumbered; numbering
/// starts at 1 on page index `first_numbered_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumbering {
    /// 0-based index of the page labelled "1"
    pub first_numbered_page: usize,
}

impl PageNumbering {
    /// Number every page starting from the first.
    pub fn all() -> Self {
        Self {
            first_numbered_page: 0,
        }
    }

    /// Display number of the page at `index`, if it is numbered.
    pub fn label(&self, index: usize) -> Option<u32> {
        index
            .checked_sub(self.first_numbered_page)
            .map(|n| n as u32 + 1)
    }

    /// Check if the page at `index` is the cover page.
    pub fn is_cover(&self, index: usize) -> bool {
        index == 0 && self.first_numbered_page > 0
    }
}

impl Default for PageNumbering {
    fn default() -> Self {
        Self {
            first_numbered_page: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PaginationOptions::default();
        assert_eq!(options.nominal_height, 864.0);
        assert_eq!(options.debounce(), Duration::from_millis(200));
        assert_eq!(options.initial_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_letter_content_height() {
        let options = PaginationOptions::for_page(PageSize::Letter, 1.0);
        assert_eq!(options.nominal_height, DEFAULT_NOMINAL_HEIGHT);

        let a4 = PageSize::A4.content_height(1.0);
        assert!((a4 - 930.52).abs() < 0.1);
    }

    #[test]
    fn test_builder() {
        let options = PaginationOptions::new()
            .with_nominal_height(500.0)
            .with_debounce(Duration::from_millis(50))
            .with_numbering(PageNumbering::all());
        assert_eq!(options.nominal_height, 500.0);
        assert_eq!(options.debounce_ms, 50);
        assert_eq!(options.numbering.label(0), Some(1));
    }

    #[test]
    fn test_from_json_partial() {
        let options = PaginationOptions::from_json(r#"{"nominal_height": 700}"#).unwrap();
        assert_eq!(options.nominal_height, 700.0);
        assert_eq!(options.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(options.numbering.first_numbered_page, 2);
    }

    #[test]
    fn test_page_numbering() {
        let numbering = PageNumbering::default();
        assert_eq!(numbering.label(0), None);
        assert_eq!(numbering.label(1), None);
        assert_eq!(numbering.label(2), Some(1));
        assert_eq!(numbering.label(5), Some(4));
        assert!(numbering.is_cover(0));
        assert!(!PageNumbering::all().is_cover(0));
    }
}
