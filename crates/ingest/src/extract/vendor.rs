use super::markup;
use crate::error::ExtractError;
use crate::model::{OrderDraft, RawEmailMessage};

/// Vendor-specific extraction, selected by [`VendorAdapter::matches`].
///
/// A matching vendor owns the draft completely; the engine does not fall
/// back to the generic strategies.
pub trait VendorAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, raw: &RawEmailMessage) -> bool;

    fn draft(&self, raw: &RawEmailMessage) -> Result<OrderDraft, ExtractError>;
}

/// Load-board tenders, recognised by the id of their stop table.
#[derive(Debug, Clone)]
pub struct LoadBoardVendor {
    sentinel: String,
}

impl LoadBoardVendor {
    pub const NAME: &'static str = "load_board";
    pub const DEFAULT_SENTINEL: &'static str = "stopsDiv";

    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }
}

impl Default for LoadBoardVendor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SENTINEL)
    }
}

impl VendorAdapter for LoadBoardVendor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn matches(&self, raw: &RawEmailMessage) -> bool {
        raw.body_html.contains(&self.sentinel) || raw.body_plain.contains(&self.sentinel)
    }

    fn draft(&self, raw: &RawEmailMessage) -> Result<OrderDraft, ExtractError> {
        let doc = markup::parse_document(&raw.body_html)?;
        Ok(markup::draft_load_tender(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_sentinel() {
        let vendor = LoadBoardVendor::default();
        let raw = RawEmailMessage {
            body_html: r#"<div id="stopsDiv"></div>"#.into(),
            ..RawEmailMessage::default()
        };
        assert!(vendor.matches(&raw));
        assert!(!vendor.matches(&RawEmailMessage::default()));
    }

    #[test]
    fn sentinel_without_markup_fails() {
        let vendor = LoadBoardVendor::default();
        let raw = RawEmailMessage {
            body_plain: "see stopsDiv".into(),
            ..RawEmailMessage::default()
        };
        assert!(vendor.matches(&raw));
        assert!(vendor.draft(&raw).is_err());
    }
}
