use std::borrow::Cow;

use super::{markup, plain_text, strip_tags};
use crate::error::ExtractError;
use crate::model::{OrderDraft, RawEmailMessage};

/// The two ways a body is turned into a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    StructuredMarkup,
    PlainText,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::StructuredMarkup => "structured_markup",
            Strategy::PlainText => "plain_text",
        }
    }

    pub fn draft(self, raw: &RawEmailMessage) -> Result<OrderDraft, ExtractError> {
        match self {
            Strategy::StructuredMarkup => {
                let doc = markup::parse_document(&raw.body_html)?;
                Ok(markup::draft(&doc))
            }
            Strategy::PlainText => {
                let text = plain_text_body(raw);
                if text.trim().is_empty() {
                    return Err(ExtractError::MissingBody);
                }
                Ok(plain_text::draft(&text))
            }
        }
    }
}

/// The plain-text body, or the tag-stripped HTML body when there is none.
pub fn plain_text_body(raw: &RawEmailMessage) -> Cow<'_, str> {
    if raw.body_plain.trim().is_empty() {
        Cow::Owned(strip_tags(&raw.body_html))
    } else {
        Cow::Borrowed(raw.body_plain.as_str())
    }
}
