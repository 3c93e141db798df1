//! Parsing and loading of proxy lists.

use crate::error::ProxyPoolError;

use log::warn;
use reqwest::Client;
use std::path::Path;
use url::Url;

/// Parse a single proxy address.
///
/// Bare `host:port` input gets `default_scheme` prepended.
pub fn parse_proxy(input: &str, default_scheme: &str) -> Result<Url, ProxyPoolError> {
    let input = input.trim();
    let parsed = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("{}://{}", default_scheme, input))
    };

    parsed.map_err(|source| ProxyPoolError::InvalidProxy {
        input: input.to_string(),
        source,
    })
}

/// Parse text content with one proxy per line.
///
/// Blank lines and `#` comments are skipped, as are lines that fail to parse.
pub fn parse_proxy_list(content: &str, default_scheme: &str) -> Vec<Url> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match parse_proxy(line, default_scheme) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Skipping proxy list entry: {}", e);
                None
            }
        })
        .collect()
}

/// Fetch and parse a list of proxies from a URL or file path.
pub async fn fetch_proxies_from_source(
    source: &str,
    default_scheme: &str,
) -> Result<Vec<Url>, ProxyPoolError> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        let client = Client::new();
        let response = client.get(source).send().await?.error_for_status()?;
        response.text().await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|source_err| ProxyPoolError::Read {
                path: Path::new(source).to_path_buf(),
                source: source_err,
            })?
    };

    Ok(parse_proxy_list(&content, default_scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_port_gets_default_scheme() {
        let url = parse_proxy("10.0.0.1:3128", "http").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("10.0.0.1"));
        assert_eq!(url.port(), Some(3128));
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = parse_proxy(" socks5://10.0.0.1:1080 ", "http").unwrap();
        assert_eq!(url.scheme(), "socks5");
    }

    #[test]
    fn invalid_address_is_an_error() {
        let err = parse_proxy("http://[::1", "http").unwrap_err();
        assert!(matches!(err, ProxyPoolError::InvalidProxy { .. }));
    }

    #[test]
    fn list_skips_comments_blanks_and_garbage() {
        let content = "\
# free proxies
socks5://127.0.0.1:1080

127.0.0.2:1080
http://[::1
";
        let urls = parse_proxy_list(content, "socks5");
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "socks5://127.0.0.1:1080");
        assert_eq!(urls[1].as_str(), "socks5://127.0.0.2:1080");
    }

    #[tokio::test]
    async fn reads_list_from_file() {
        let path = std::env::temp_dir().join(format!("proxy-list-{}.txt", std::process::id()));
        tokio::fs::write(&path, "127.0.0.1:8080\n127.0.0.1:8081\n")
            .await
            .unwrap();

        let urls = fetch_proxies_from_source(path.to_str().unwrap(), "http")
            .await
            .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|u| u.scheme() == "http"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = tokio_test::block_on(fetch_proxies_from_source(
            "/nonexistent/proxy-list.txt",
            "http",
        ));
        assert!(matches!(result, Err(ProxyPoolError::Read { .. })));
    }
}
