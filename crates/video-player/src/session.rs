//! Playback session and source URL routing.

use url::Url;
use video_player_types::PlayableUnit;

use crate::config::ProxyConfig;

/// How the session's source is fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRoute {
    /// The unit's own URL.
    Direct,
    /// The unit's URL wrapped by the same-origin proxy.
    Proxied,
}

/// The unit bound to the player and the URL currently handed to the element.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSession {
    unit: PlayableUnit,
    route: SourceRoute,
    source_url: String,
    same_origin: bool,
}

impl PlaybackSession {
    pub fn new(unit: PlayableUnit, proxy: &ProxyConfig) -> Self {
        let same_origin = is_same_origin(&unit.source_url, &proxy.app_origin);
        Self {
            source_url: unit.source_url.clone(),
            unit,
            route: SourceRoute::Direct,
            same_origin,
        }
    }

    pub fn unit(&self) -> &PlayableUnit {
        &self.unit
    }

    pub fn route(&self) -> SourceRoute {
        self.route
    }

    /// URL currently bound to the element.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Whether the unit's direct URL is readable by the audio graph.
    pub fn same_origin(&self) -> bool {
        self.same_origin
    }

    /// Switch route and return the URL to bind.
    pub fn reroute(&mut self, route: SourceRoute, proxy: &ProxyConfig) -> &str {
        self.route = route;
        self.source_url = match route {
            SourceRoute::Direct => self.unit.source_url.clone(),
            SourceRoute::Proxied => proxied_url(&self.unit.source_url, proxy),
        };
        &self.source_url
    }
}

/// Compare the origin (scheme, host, port) of `source` with the app origin.
///
/// Relative URLs resolve against the app and count as same-origin; URLs that
/// cannot be parsed are treated as cross-origin.
pub fn is_same_origin(source: &str, app_origin: &str) -> bool {
    let Ok(app) = Url::parse(app_origin) else {
        return false;
    };
    match app.join(source) {
        Ok(resolved) => resolved.origin() == app.origin(),
        Err(_) => false,
    }
}

/// Wrap `source` in the proxy endpoint on the app origin.
pub fn proxied_url(source: &str, proxy: &ProxyConfig) -> String {
    let encoded = urlencoding::encode(source);
    format!(
        "{}/{}?{}={encoded}",
        proxy.app_origin.trim_end_matches('/'),
        proxy.endpoint.trim_start_matches('/'),
        proxy.query_param
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> ProxyConfig {
        ProxyConfig {
            app_origin: "https://catalog.example.com".to_string(),
            endpoint: "/api/proxy".to_string(),
            query_param: "url".to_string(),
        }
    }

    fn unit(url: &str) -> PlayableUnit {
        PlayableUnit {
            source_url: url.to_string(),
            title: "Feature".to_string(),
            ..PlayableUnit::default()
        }
    }

    #[test]
    fn origin_comparison_uses_scheme_host_and_port() {
        let app = "https://catalog.example.com";
        assert!(is_same_origin("https://catalog.example.com/media/a.mp4", app));
        assert!(is_same_origin("/media/a.mp4", app));
        assert!(!is_same_origin("http://catalog.example.com/media/a.mp4", app));
        assert!(!is_same_origin("https://catalog.example.com:8443/a.mp4", app));
        assert!(!is_same_origin("https://cdn.example.net/a.mp4", app));
    }

    #[test]
    fn proxied_url_encodes_the_source() {
        let url = proxied_url("https://cdn.example.net/a b.mp4?sig=1&x=2", &proxy());
        assert_eq!(
            url,
            "https://catalog.example.com/api/proxy?url=https%3A%2F%2Fcdn.example.net%2Fa%20b.mp4%3Fsig%3D1%26x%3D2"
        );
        assert!(is_same_origin(&url, &proxy().app_origin));
    }

    #[test]
    fn reroute_round_trips_to_the_direct_url() {
        let mut session = PlaybackSession::new(unit("https://cdn.example.net/a.mp4"), &proxy());
        assert!(!session.same_origin());

        let proxied = session.reroute(SourceRoute::Proxied, &proxy()).to_string();
        assert!(proxied.starts_with("https://catalog.example.com/api/proxy?url="));
        assert_eq!(session.route(), SourceRoute::Proxied);

        session.reroute(SourceRoute::Direct, &proxy());
        assert_eq!(session.source_url(), "https://cdn.example.net/a.mp4");
    }
}
