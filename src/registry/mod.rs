//! Package registry client
//!
//! Resolves `package@version` to a tarball URL through the registry's
//! metadata endpoint, and fetches arbitrary payloads with a bounded
//! redirect chain.

pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use transport::{RawResponse, Transport, UreqTransport};

use crate::config::RegistryConfig;
use crate::error::{StageError, StageResult};
use tracing::{debug, warn};
use url::Url;

/// Registry client over a pluggable transport
#[derive(Debug, Clone)]
pub struct RegistryClient<T = UreqTransport> {
    transport: T,
    base_url: Url,
    package: String,
    max_redirects: u32,
}

impl RegistryClient<UreqTransport> {
    /// Create a client backed by `ureq` from registry settings
    pub fn from_config(config: &RegistryConfig) -> StageResult<Self> {
        Self::new(
            UreqTransport::new(config.timeout()),
            &config.url,
            &config.package,
            config.max_redirects,
        )
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Create a client over an explicit transport
    pub fn new(transport: T, base_url: &str, package: &str, max_redirects: u32) -> StageResult<Self> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StageError::Argument(format!("Invalid registry URL: {base_url}")))?;

        Ok(Self {
            transport,
            base_url,
            package: package.to_string(),
            max_redirects,
        })
    }

    /// Package this client resolves
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Metadata URL for one published version.
    /// The package name is one path segment, so a scope's `/` is encoded.
    pub fn metadata_url(&self, version: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.package).push(version);
        }
        url.to_string()
    }

    /// Resolve the tarball URL for `package@version`
    ///
    /// A missing `dist.tarball` field and an unparseable metadata document
    /// both surface as `NotFound`.
    pub async fn tarball_url(&self, version: &str) -> StageResult<String> {
        let url = self.metadata_url(version);
        let body = self.fetch(&url).await?;

        let not_found = || StageError::NotFound {
            package: self.package.clone(),
            version: version.to_string(),
        };

        let metadata: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!("Malformed registry metadata from {}: {}", url, e);
                return Err(not_found());
            }
        };

        let tarball = metadata
            .pointer("/dist/tarball")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(not_found)?;

        debug!("Resolved {}@{} -> {}", self.package, version, tarball);
        Ok(tarball.to_string())
    }

    /// Fetch a URL, following 301/302/307/308 up to the redirect limit
    pub async fn fetch(&self, url: &str) -> StageResult<Vec<u8>> {
        let mut current =
            Url::parse(url).map_err(|e| StageError::network(url, format!("invalid URL: {e}")))?;
        let mut redirects = 0u32;

        loop {
            let response = self.transport.get(current.as_str()).await?;

            if response.is_redirect() {
                if let Some(location) = response.location.as_deref() {
                    if redirects >= self.max_redirects {
                        return Err(StageError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.max_redirects,
                        });
                    }
                    redirects += 1;
                    let next = current.join(location).map_err(|e| StageError::Request {
                        status: Some(response.status),
                        url: current.to_string(),
                        reason: Some(format!("invalid Location '{location}': {e}")),
                    })?;
                    debug!("Redirect {} -> {}", current, next);
                    current = next;
                    continue;
                }
            }

            if !response.is_success() {
                return Err(StageError::status(response.status, current.as_str()));
            }

            return Ok(response.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeTransport;
    use super::*;

    const REGISTRY: &str = "https://registry.example";

    fn client(fake: &FakeTransport) -> RegistryClient<FakeTransport> {
        RegistryClient::new(fake.clone(), REGISTRY, "@openai/codex", 5).unwrap()
    }

    #[test]
    fn metadata_url_encodes_scoped_package_as_one_segment() {
        let fake = FakeTransport::new();
        let client =
            RegistryClient::new(fake.clone(), "https://registry.example/", "@openai/codex", 5)
                .unwrap();
        assert_eq!(
            client.metadata_url("0.46.0-linux-x64"),
            "https://registry.example/@openai%2Fcodex/0.46.0-linux-x64"
        );

        let mirror =
            RegistryClient::new(fake, "https://mirror.example/npm/", "plain-name", 5).unwrap();
        assert_eq!(
            mirror.metadata_url("1.0.0"),
            "https://mirror.example/npm/plain-name/1.0.0"
        );
    }

    #[test]
    fn invalid_registry_url_is_rejected() {
        for base in ["not a url", "mailto:someone@example.com"] {
            let err = RegistryClient::new(FakeTransport::new(), base, "@openai/codex", 5)
                .unwrap_err();
            assert!(matches!(err, StageError::Argument(_)), "{base}: {err:?}");
        }
    }

    async fn follow_once(from: &str, location: &str, to: &str) -> Vec<u8> {
        let fake = FakeTransport::new();
        fake.redirect(from, 302, location);
        fake.ok(to, b"payload".to_vec());
        client(&fake).fetch(from).await.unwrap()
    }

    #[tokio::test]
    async fn location_forms_resolve_against_current_url() {
        let base = "https://a.example/x/y.tgz";
        follow_once(base, "https://b.example/z", "https://b.example/z").await;
        follow_once(base, "/z.tgz", "https://a.example/z.tgz").await;
        follow_once(base, "//c.example/z", "https://c.example/z").await;
        follow_once(base, "w.tgz", "https://a.example/x/w.tgz").await;
    }

    #[tokio::test]
    async fn location_with_url_in_query_stays_relative() {
        let body = follow_once(
            "https://registry.example/a/b.tgz",
            "/signed?origin=https://a.example/pkg.tgz",
            "https://registry.example/signed?origin=https://a.example/pkg.tgz",
        )
        .await;
        assert_eq!(body, b"payload");
    }

    #[tokio::test]
    async fn slash_in_base_query_does_not_change_directory() {
        follow_once(
            "https://cdn.example/dl/pkg.tgz?token=a/b",
            "next.tgz",
            "https://cdn.example/dl/next.tgz",
        )
        .await;
    }

    #[tokio::test]
    async fn redirect_chain_returns_final_body() {
        let fake = FakeTransport::new();
        fake.redirect("https://a.example/pkg.tgz", 302, "https://b.example/pkg.tgz");
        fake.redirect("https://b.example/pkg.tgz", 302, "https://c.example/pkg.tgz");
        fake.ok("https://c.example/pkg.tgz", b"\x1f\x8b tarball bytes".to_vec());

        let body = client(&fake).fetch("https://a.example/pkg.tgz").await.unwrap();
        assert_eq!(body, b"\x1f\x8b tarball bytes");
        assert_eq!(fake.request_count(), 3);
    }

    #[tokio::test]
    async fn redirect_cap_is_enforced() {
        let fake = FakeTransport::new();
        fake.redirect("https://loop.example/a", 301, "https://loop.example/b");
        fake.redirect("https://loop.example/b", 308, "https://loop.example/a");

        let client = RegistryClient::new(fake.clone(), REGISTRY, "@openai/codex", 3).unwrap();
        let err = client.fetch("https://loop.example/a").await.unwrap_err();

        assert!(matches!(err, StageError::TooManyRedirects { limit: 3, .. }));
        assert!(err.is_request());
        assert_eq!(fake.request_count(), 4);
    }

    #[tokio::test]
    async fn redirect_without_location_is_an_error() {
        let fake = FakeTransport::new();
        fake.respond("https://a.example/x", 302, None, vec![]);

        let err = client(&fake).fetch("https://a.example/x").await.unwrap_err();
        assert!(matches!(err, StageError::Request { status: Some(302), .. }));
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_url() {
        let fake = FakeTransport::new();
        fake.redirect("https://a.example/x", 307, "https://b.example/missing");
        fake.respond("https://b.example/missing", 404, None, vec![]);

        let err = client(&fake).fetch("https://a.example/x").await.unwrap_err();
        match err {
            StageError::Request { status, url, .. } => {
                assert_eq!(status, Some(404));
                assert_eq!(url, "https://b.example/missing");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tarball_url_from_metadata() {
        let fake = FakeTransport::new();
        let client = client(&fake);
        fake.ok(
            &client.metadata_url("0.46.0-linux-x64"),
            br#"{"name":"@openai/codex","dist":{"tarball":"https://cdn.example/codex.tgz"}}"#
                .to_vec(),
        );

        let url = client.tarball_url("0.46.0-linux-x64").await.unwrap();
        assert_eq!(url, "https://cdn.example/codex.tgz");
    }

    #[tokio::test]
    async fn tarball_missing_field_is_not_found() {
        let fake = FakeTransport::new();
        let client = client(&fake);
        fake.ok(&client.metadata_url("1.0.0-x"), br#"{"dist":{}}"#.to_vec());
        fake.ok(&client.metadata_url("1.0.1-x"), b"<html>oops</html>".to_vec());

        for version in ["1.0.0-x", "1.0.1-x"] {
            let err = client.tarball_url(version).await.unwrap_err();
            match err {
                StageError::NotFound { package, version: v } => {
                    assert_eq!(package, "@openai/codex");
                    assert_eq!(v, version);
                }
                other => panic!("expected NotFound, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn unknown_version_propagates_request_error() {
        let fake = FakeTransport::new();
        let client = client(&fake);

        let err = client.tarball_url("9.9.9-none").await.unwrap_err();
        assert!(matches!(err, StageError::Request { status: Some(404), .. }));
    }
}
