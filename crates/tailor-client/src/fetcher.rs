use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Client, ClientBuilder, Response, StatusCode, redirect};
use tailor_core::error::AppError;
use tailor_core::traits::Fetcher;
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; ResumeTailor/0.1; +https://github.com/resume-tailor)";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 10;

/// Which hosts a job URL may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPolicy {
    /// Reject hosts that are, or resolve to, loopback, private, link-local,
    /// or otherwise reserved addresses.
    PublicOnly,
    Any,
}

impl HostPolicy {
    /// Checks the URL's host and returns the addresses it resolved to, so the
    /// request can be pinned to them. Empty when there is nothing to pin (an
    /// IP literal, or [`HostPolicy::Any`]).
    async fn admit(self, url: &Url) -> Result<Vec<SocketAddr>, AppError> {
        if self == HostPolicy::Any {
            return Ok(Vec::new());
        }
        let Some(host) = url.host_str() else {
            return Err(AppError::HttpError("Job URL has no host".into()));
        };
        let literal = host.trim_start_matches('[').trim_end_matches(']');

        if let Ok(ip) = literal.parse::<IpAddr>() {
            if is_reserved(ip) {
                return Err(not_public(host, ip));
            }
            return Ok(Vec::new());
        }

        let port = url.port_or_known_default().unwrap_or(443);
        let resolved: Vec<SocketAddr> = tokio::net::lookup_host((literal, port))
            .await
            .map_err(|e| AppError::NetworkError(format!("Cannot resolve {host}: {e}")))?
            .collect();

        match resolved.iter().map(SocketAddr::ip).find(|ip| is_reserved(*ip)) {
            Some(ip) => Err(not_public(host, ip)),
            None if resolved.is_empty() => Err(AppError::NetworkError(format!(
                "Cannot resolve {host}: no addresses"
            ))),
            None => Ok(resolved),
        }
    }
}

fn not_public(host: &str, ip: IpAddr) -> AppError {
    AppError::HttpError(format!(
        "Refusing to fetch {host}: {ip} is not a public address"
    ))
}

/// Downloads job posting pages with reqwest.
///
/// The server keeps the default [`HostPolicy::PublicOnly`]; the CLI runs on
/// the user's own machine and switches to [`HostPolicy::Any`]. Redirects are
/// followed here rather than by reqwest, so every hop passes the policy and
/// is sent to the addresses that were checked.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
    policy: HostPolicy,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(client_builder(timeout))?,
            timeout,
            policy: HostPolicy::PublicOnly,
        })
    }

    pub fn with_policy(mut self, policy: HostPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn allow_private_urls(self) -> Self {
        self.with_policy(HostPolicy::Any)
    }

    pub fn policy(&self) -> HostPolicy {
        self.policy
    }

    /// Requests `target`, which the caller has already admitted, and follows
    /// redirects. Each new location is admitted before it is requested.
    async fn follow(
        &self,
        mut target: Url,
        mut pinned: Vec<SocketAddr>,
    ) -> Result<String, AppError> {
        for _ in 0..=MAX_REDIRECTS {
            tracing::debug!(url = %target, "Fetching job page");
            let response = self
                .client_for(&target, &pinned)?
                .get(target.clone())
                .send()
                .await
                .map_err(|e| send_error(e, self.timeout))?;

            let status = response.status();
            if status.is_redirection()
                && let Some(next) = redirect_location(&target, &response)?
            {
                tracing::debug!(from = %target, to = %next, "Following redirect");
                pinned = self.policy.admit(&next).await?;
                target = next;
                continue;
            }

            if !status.is_success() {
                let hint =
                    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                        ": the site refused automated access"
                    } else {
                        ""
                    };
                return Err(AppError::HttpError(format!(
                    "HTTP {} from {target}{hint}",
                    status.as_u16()
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| AppError::HttpError(format!("Cannot read page body: {e}")));
        }

        Err(AppError::HttpError(format!(
            "Too many redirects (more than {MAX_REDIRECTS})"
        )))
    }

    fn client_for(&self, target: &Url, pinned: &[SocketAddr]) -> Result<Client, AppError> {
        match target.host_str() {
            Some(host) if !pinned.is_empty() => {
                build_client(client_builder(self.timeout).resolve_to_addrs(host, pinned))
            }
            _ => Ok(self.client.clone()),
        }
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(redirect::Policy::none())
}

fn build_client(builder: ClientBuilder) -> Result<Client, AppError> {
    builder
        .build()
        .map_err(|e| AppError::HttpError(format!("Cannot build HTTP client: {e}")))
}

/// The next URL of a redirect, resolved against the current one. `None` when
/// the response carries no `Location`.
fn redirect_location(current: &Url, response: &Response) -> Result<Option<Url>, AppError> {
    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| AppError::HttpError("Redirect has an unreadable Location header".into()))?;
    let next = current
        .join(location)
        .map_err(|e| AppError::HttpError(format!("Invalid redirect to '{location}': {e}")))?;
    parse_http_url(next.as_str()).map(Some)
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let target = parse_http_url(url)?;
        let pinned = self.policy.admit(&target).await?;
        self.follow(target, pinned).await
    }
}

fn send_error(e: reqwest::Error, timeout: Duration) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Cannot connect: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

/// Parses a job URL. Only `http` and `https` with a host are accepted.
pub fn parse_http_url(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| AppError::HttpError(format!("Invalid job URL '{url}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::HttpError(format!(
            "Job URL must use http or https, not '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::HttpError("Job URL has no host".into()));
    }
    Ok(parsed)
}

fn is_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            let shared = a == 100 && (64..128).contains(&b);
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || shared
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_reserved(IpAddr::V4(v4));
            }
            let head = v6.segments()[0];
            let unique_local = head & 0xfe00 == 0xfc00;
            let link_local = head & 0xffc0 == 0xfe80;
            v6.is_loopback() || v6.is_unspecified() || unique_local || link_local
        }
    }
}
