//! Runtime configuration for gameview.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both; see `main.rs`.

use std::path::PathBuf;

/// Default `host:port` of the analysis push channel.
const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:7878";

/// Default base URL of the HTTP submission endpoint.
const DEFAULT_HTTP_URL: &str = "http://127.0.0.1:8080";

/// Default directory for rolling log files.
const DEFAULT_LOG_DIR: &str = "logs";

/// Get the address of the analysis push channel.
///
/// Priority:
/// 1. `GAMEVIEW_SERVER_ADDR` env variable if set
/// 2. `127.0.0.1:7878` as fallback
pub fn get_server_addr() -> String {
    server_addr_from(std::env::var("GAMEVIEW_SERVER_ADDR").ok())
}

/// Get the base URL games are submitted to.
///
/// Priority:
/// 1. `GAMEVIEW_HTTP_URL` env variable if set
/// 2. `http://127.0.0.1:8080` as fallback
pub fn get_http_url() -> String {
    http_url_from(std::env::var("GAMEVIEW_HTTP_URL").ok())
}

/// Get the directory log files are written to.
///
/// Priority:
/// 1. `GAMEVIEW_LOG_DIR` env variable if set
/// 2. `logs` as fallback
pub fn get_log_dir() -> PathBuf {
    log_dir_from(std::env::var_os("GAMEVIEW_LOG_DIR").map(PathBuf::from))
}

/// Get the path of an extra JSON opening book, if one is configured with
/// `GAMEVIEW_OPENING_BOOK`. The builtin book is always loaded.
pub fn get_opening_book_path() -> Option<PathBuf> {
    std::env::var_os("GAMEVIEW_OPENING_BOOK")
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

fn server_addr_from(value: Option<String>) -> String {
    non_empty(value).unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
}

fn http_url_from(value: Option<String>) -> String {
    non_empty(value).unwrap_or_else(|| DEFAULT_HTTP_URL.to_string())
}

fn log_dir_from(value: Option<PathBuf>) -> PathBuf {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_server_addr() {
        let addr = get_server_addr();
        match std::env::var("GAMEVIEW_SERVER_ADDR") {
            Ok(val) if !val.trim().is_empty() => assert_eq!(addr, val.trim()),
            _ => assert_eq!(addr, DEFAULT_SERVER_ADDR),
        }
    }

    #[test]
    fn test_server_addr_override() {
        assert_eq!(
            server_addr_from(Some(" 10.0.0.2:9000 ".into())),
            "10.0.0.2:9000"
        );
        assert_eq!(server_addr_from(Some("".into())), DEFAULT_SERVER_ADDR);
        assert_eq!(server_addr_from(None), DEFAULT_SERVER_ADDR);
    }

    #[test]
    fn test_http_url_default() {
        assert_eq!(http_url_from(None), DEFAULT_HTTP_URL);
        assert_eq!(
            http_url_from(Some("https://review.example".into())),
            "https://review.example"
        );
    }

    #[test]
    fn test_log_dir_default() {
        assert_eq!(log_dir_from(None), PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(log_dir_from(Some(PathBuf::new())), PathBuf::from(DEFAULT_LOG_DIR));
        assert_eq!(
            log_dir_from(Some(PathBuf::from("/var/log/gameview"))),
            PathBuf::from("/var/log/gameview")
        );
    }
}
