//! Browser-like request headers.

use std::time::Duration;

use super::FetchRequest;
use crate::config::DownloadConfig;

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";
const SEC_CH_UA: &str =
    "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"";

/// Headers and cookie attached to every request of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestProfile {
    headers: Vec<(String, String)>,
    cookie: Option<String>,
}

impl RequestProfile {
    /// Headers a desktop browser would send when navigating inside `base_url`.
    ///
    /// Chrome user agents also get the `Sec-Ch-Ua*` client hints.
    pub fn browser(user_agent: &str, base_url: &str, cookie: Option<&str>) -> Self {
        let origin = base_url.trim_end_matches('/');
        let mut headers = vec![
            ("User-Agent".to_string(), user_agent.to_string()),
            ("Referer".to_string(), format!("{}/", origin)),
            ("Origin".to_string(), origin.to_string()),
            ("Accept".to_string(), ACCEPT.to_string()),
            ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
        ];

        if user_agent.contains("Chrome/") {
            let platform = if user_agent.contains("Macintosh") {
                "\"macOS\""
            } else if user_agent.contains("Linux") {
                "\"Linux\""
            } else {
                "\"Windows\""
            };
            headers.push(("Sec-Ch-Ua".to_string(), SEC_CH_UA.to_string()));
            headers.push(("Sec-Ch-Ua-Mobile".to_string(), "?0".to_string()));
            headers.push(("Sec-Ch-Ua-Platform".to_string(), platform.to_string()));
        }

        Self {
            headers,
            cookie: cookie.filter(|c| !c.trim().is_empty()).map(str::to_string),
        }
    }

    /// Profile for the user agent, base URL and cookie in `config`.
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::browser(&config.user_agent, &config.base_url, config.cookie.as_deref())
    }

    /// Build a request for `url` carrying this profile.
    pub fn request(&self, url: &str, timeout: Duration) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            headers: self.headers.clone(),
            cookie: self.cookie.clone(),
            timeout,
        }
    }

    /// Header list in send order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the named header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookie sent with every request.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}
