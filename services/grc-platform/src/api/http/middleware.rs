//! 会话中间件

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::application::RequestContext;

/// 请求上下文提取器
///
/// 由 `session_middleware` 注入；中间件未运行时视为匿名请求
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::anonymous(None));
        Ok(Ctx(ctx))
    }
}

/// 来源地址
///
/// 连接来自受信代理时取 `X-Forwarded-For` 的第一个地址，否则取连接地址
pub fn client_origin(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<String> {
    let peer_ip = peer.map(|addr| addr.ip())?;
    if !trusted_proxies.contains(&peer_ip) {
        return Some(peer_ip.to_string());
    }

    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| Some(peer_ip.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 解析会话令牌并注入 `RequestContext`
///
/// 令牌无效时按匿名请求处理，是否需要登录由各操作的访问策略决定
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let origin = client_origin(request.headers(), peer, &state.trusted_proxies);

    let ctx = match bearer_token(request.headers()) {
        Some(token) => match state.platform.token_service().verify(token) {
            Ok(claims) => RequestContext::with_session(claims.sid, origin),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                RequestContext::anonymous(origin)
            }
        },
        None => RequestContext::anonymous(origin),
    };

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers
    }

    #[test]
    fn test_forwarded_for_from_trusted_proxy() {
        let proxy: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap()];

        assert_eq!(
            client_origin(&forwarded(), Some(proxy), &trusted).as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(
            client_origin(&HeaderMap::new(), Some(proxy), &trusted).as_deref(),
            Some("10.0.0.1")
        );
    }

    #[test]
    fn test_forwarded_for_ignored_from_untrusted_peer() {
        let peer: SocketAddr = "198.51.100.9:40000".parse().unwrap();
        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap()];

        assert_eq!(
            client_origin(&forwarded(), Some(peer), &trusted).as_deref(),
            Some("198.51.100.9")
        );
        assert_eq!(client_origin(&forwarded(), Some(peer), &[]).as_deref(), Some("198.51.100.9"));
        assert_eq!(client_origin(&forwarded(), None, &trusted), None);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
