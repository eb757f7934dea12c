//! Unified fetcher: local-or-HTTP text/JSON reads through a content-addressed
//! cache (spec §4.B, §5).

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FetchError;
use crate::locator::is_http;

/// Caller-supplied configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Root directory for the content-addressed HTTP cache.
    pub cache_dir: PathBuf,
    /// Optional HTTP proxy URL.
    pub proxy: Option<String>,
    /// Default freshness window applied when a response carries no
    /// `Cache-Control: max-age`.
    pub default_ttl: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".typings-cache"),
            proxy: None,
            default_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Read bytes from a local file or HTTP(S) URL, stripping a UTF-8 BOM.
///
/// Remote reads are served through the content-addressed cache in
/// `config.cache_dir`; local reads are never cached.
///
/// # Errors
/// Returns `FetchError::NotFound` for a missing local file, `HttpStatus` for
/// a non-200 remote response, `NetworkError` if the request cannot complete,
/// or an I/O variant if the cache cannot be read or written.
pub fn fetch_text(location: &str, config: &FetchConfig) -> Result<String, FetchError> {
    let raw = if is_http(location) {
        fetch_http_cached(location, config)?
    } else {
        fetch_local(location)?
    };
    Ok(strip_bom(raw))
}

/// Fetch `location` and parse it as JSON.
///
/// # Errors
/// As [`fetch_text`], plus `FetchError::JsonParse` carrying `location` when
/// the fetched text is not valid JSON.
pub fn fetch_json(location: &str, config: &FetchConfig) -> Result<serde_json::Value, FetchError> {
    let text = fetch_text(location, config)?;
    serde_json::from_str(&text).map_err(|source| FetchError::JsonParse {
        path: location.to_owned(),
        source,
    })
}

fn fetch_local(path: &str) -> Result<String, FetchError> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(FetchError::NotFound {
            path: path.to_owned(),
        });
    }
    std::fs::read_to_string(p).map_err(|source| FetchError::Io {
        path: path.to_owned(),
        source,
    })
}

fn strip_bom(mut s: String) -> String {
    if s.starts_with('\u{feff}') {
        s = s.split_off('\u{feff}'.len_utf8());
    }
    s
}

/// A single cache entry persisted on disk as `<cache_dir>/<key[0..2]>/<key>`,
/// paired with a sibling `.meta` file carrying the expiry timestamp.
struct CacheEntry {
    content_path: PathBuf,
    meta_path: PathBuf,
}

impl CacheEntry {
    fn for_key(cache_dir: &Path, key: &str) -> Self {
        let Some(prefix) = key.get(0..2) else {
            // Unreachable: keys are 64-hex-char SHA-256 digests.
            let dir = cache_dir.join(key);
            return Self {
                content_path: dir.join("body"),
                meta_path: dir.join("meta"),
            };
        };
        let dir = cache_dir.join(prefix).join(key);
        Self {
            content_path: dir.join("body"),
            meta_path: dir.join("meta"),
        }
    }

    fn dir(&self) -> &Path {
        self.content_path
            .parent()
            .unwrap_or(&self.content_path)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir().with_extension("lock")
    }

    /// Read a live (non-expired) cached body, if present.
    fn read_live(&self) -> Option<String> {
        let meta = std::fs::read_to_string(&self.meta_path).ok()?;
        let expires_at: u64 = meta.trim().parse().ok()?;
        let now = unix_time_now();
        if now >= expires_at {
            return None;
        }
        std::fs::read_to_string(&self.content_path).ok()
    }

    /// Persist a fresh body with the given expiry, guarded by the lockfile
    /// protocol in spec §5 (250ms poll, 25 retries, 60s stale override).
    fn write(&self, body: &str, expires_at: u64) -> Result<(), FetchError> {
        crate::fs::ensure_dir(self.dir()).map_err(|e| FetchError::CacheIo {
            path: self.dir().display().to_string(),
            source: std::io::Error::other(e.to_string()),
        })?;

        let _guard = FileLock::acquire(&self.lock_path())?;

        let tmp = self.content_path.with_extension("tmp");
        std::fs::write(&tmp, body).map_err(|source| FetchError::CacheIo {
            path: tmp.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp, &self.content_path).map_err(|source| FetchError::CacheIo {
            path: self.content_path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.meta_path, expires_at.to_string()).map_err(|source| {
            FetchError::CacheIo {
                path: self.meta_path.display().to_string(),
                source,
            }
        })?;
        Ok(())
    }
}

/// An advisory lock on `<path>` implemented with an exclusive-create sentinel
/// file, released on drop. Mirrors the atomic-write-then-rename discipline
/// the rest of this codebase uses for shared mutable state (spec §5).
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    const POLL_INTERVAL: Duration = Duration::from_millis(250);
    const MAX_RETRIES: u32 = 25;
    const STALE_AFTER: Duration = Duration::from_secs(60);

    fn acquire(path: &Path) -> Result<Self, FetchError> {
        for attempt in 0..Self::MAX_RETRIES {
            match std::fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(path)
            {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Self::is_stale(path) {
                        let _ = std::fs::remove_file(path);
                        continue;
                    }
                    if attempt + 1 < Self::MAX_RETRIES {
                        std::thread::sleep(Self::POLL_INTERVAL);
                    }
                }
                Err(source) => {
                    return Err(FetchError::CacheIo {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }
        Err(FetchError::LockTimeout {
            path: path.display().to_string(),
            retries: Self::MAX_RETRIES,
        })
    }

    fn is_stale(path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > Self::STALE_AFTER)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn fetch_http_cached(url: &str, config: &FetchConfig) -> Result<String, FetchError> {
    let key = crate::hash::sha256_str(url);
    let entry = CacheEntry::for_key(&config.cache_dir, &key);

    if let Some(body) = entry.read_live() {
        return Ok(body);
    }

    let (body, max_age) = fetch_http(url, config)?;
    let expires_at = unix_time_now() + max_age.unwrap_or(config.default_ttl).as_secs();
    entry.write(&body, expires_at)?;
    Ok(body)
}

fn fetch_http(url: &str, config: &FetchConfig) -> Result<(String, Option<Duration>), FetchError> {
    let mut builder = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(30)))
        .timeout_global(Some(Duration::from_secs(60)));
    if let Some(proxy_url) = &config.proxy {
        if let Ok(proxy) = ureq::Proxy::new(proxy_url) {
            builder = builder.proxy(Some(proxy));
        }
    }
    let agent = ureq::Agent::new_with_config(builder.build());

    let response = agent.get(url).call().map_err(|e| FetchError::NetworkError {
        url: url.to_owned(),
        message: e.to_string(),
    })?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(FetchError::HttpStatus {
            url: url.to_owned(),
            code: status,
        });
    }

    let max_age = response
        .headers()
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age);

    let mut body = String::new();
    response
        .into_body()
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| FetchError::NetworkError {
            url: url.to_owned(),
            message: e.to_string(),
        })?;

    Ok((body, max_age))
}

fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control.split(',').find_map(|directive| {
        let directive = directive.trim();
        let rest = directive.strip_prefix("max-age=")?;
        rest.parse::<u64>().ok().map(Duration::from_secs)
    })
}

fn unix_time_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
