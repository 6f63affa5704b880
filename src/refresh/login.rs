/// Detects the platform's login wall from visible page text.
#[derive(Debug, Clone)]
pub struct LoginDetector {
    phrases: Vec<String>,
}

impl LoginDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(Into::<String>::into)
                .filter(|p| !p.trim().is_empty())
                .collect(),
        }
    }

    /// Returns the first login phrase found in `text`.
    pub fn detect<'a>(&'a self, text: &str) -> Option<&'a str> {
        self.phrases
            .iter()
            .find(|phrase| text.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::RefreshConfig;

    fn detector() -> LoginDetector {
        LoginDetector::new(RefreshConfig::default().login_phrases)
    }

    #[test]
    fn test_detects_login_prompt() {
        assert!(detector().detect("扫码登录后查看更多内容").is_some());
        assert_eq!(detector().detect("请先登录"), Some("登录"));
    }

    #[test]
    fn test_plain_page_is_not_blocked() {
        assert_eq!(detector().detect("今天去吃了这家店 1.2w 3456"), None);
        assert_eq!(detector().detect(""), None);
    }

    #[test]
    fn test_blank_phrases_are_ignored() {
        let detector = LoginDetector::new(["", "  "]);
        assert_eq!(detector.detect("anything"), None);
    }

    #[test]
    fn test_custom_phrases() {
        let detector = LoginDetector::new(["Sign in"]);
        assert!(detector.detect("Please Sign in to continue").is_some());
        assert_eq!(detector.detect("登录"), None);
    }
}
