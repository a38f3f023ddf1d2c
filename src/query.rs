//! Reads widget parameters from the URL the widget was mounted at.

use url::Url;

pub const MODE_PARAM: &str = "mode";

/// Query parameters the widget cares about, parsed once at mount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetParams {
    mode: Option<String>,
}

impl WidgetParams {
    pub fn from_url(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw)?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Parse a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    pub fn with_mode(mode: impl Into<String>) -> Self {
        Self {
            mode: Some(mode.into()),
        }
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>) -> Self {
        let mode = pairs
            .filter(|(key, _)| key == MODE_PARAM)
            .map(|(_, value)| value.into_owned())
            .next();
        Self { mode }
    }
}
