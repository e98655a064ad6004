use net::NetError;
use url::Url;

/// Outcome of the most recently completed fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FetchResult {
    /// Nothing has completed yet.
    #[default]
    Empty,
    /// Decoded body plus the URL it came from, so relative links can resolve.
    Success { text: String, url: Url },
    Failure(NetError),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchResult::Failure(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            FetchResult::Success { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            FetchResult::Success { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&NetError> {
        match self {
            FetchResult::Failure(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_variant() {
        let url = Url::parse("https://example.com/").unwrap();
        let ok = FetchResult::Success {
            text: "<html>ok</html>".into(),
            url: url.clone(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.text(), Some("<html>ok</html>"));
        assert_eq!(ok.url(), Some(&url));
        assert_eq!(ok.error(), None);

        let err = FetchResult::Failure(NetError::Transport("refused".into()));
        assert!(err.is_failure());
        assert_eq!(err.text(), None);
        assert!(err.error().unwrap().is_transport());

        let empty = FetchResult::default();
        assert!(!empty.is_success() && !empty.is_failure());
    }
}
