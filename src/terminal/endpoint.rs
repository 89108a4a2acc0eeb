// ABOUTME: WebSocket endpoint derivation for pod and node terminals
// Builds the PTY bridge URL from the dashboard origin, target and active cluster

use crate::terminal::{error::TerminalError, target::SessionTarget};
use url::Url;

/// Where the dashboard is served from, and how to reach it during development
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Dashboard origin, e.g. `https://dashboard.example.com`
    pub origin: Url,
    /// Host (with optional port) used instead of the origin's in development
    pub dev_host: Option<String>,
    pub development: bool,
}

impl EndpointConfig {
    pub fn new(origin: &str) -> Result<Self, TerminalError> {
        let origin = Url::parse(origin)?;
        if origin.host_str().is_none() {
            return Err(TerminalError::InvalidEndpoint(format!(
                "{} has no host",
                origin
            )));
        }
        Ok(Self {
            origin,
            dev_host: None,
            development: false,
        })
    }

    pub fn with_dev_host(mut self, dev_host: Option<String>, development: bool) -> Self {
        self.dev_host = dev_host;
        self.development = development;
        self
    }

    /// `wss` iff the origin is served securely
    pub fn scheme(&self) -> &'static str {
        if self.origin.scheme() == "https" || self.origin.scheme() == "wss" {
            "wss"
        } else {
            "ws"
        }
    }

    /// The `host[:port]` part of the socket URL
    pub fn host(&self) -> String {
        if self.development {
            if let Some(dev_host) = self.dev_host.as_deref().filter(|h| !h.is_empty()) {
                return dev_host.to_string();
            }
        }
        let host = self.origin.host_str().unwrap_or("localhost");
        match self.origin.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Full socket URL for a target on the given cluster
    pub fn terminal_url(&self, target: &SessionTarget, cluster: &str) -> Result<Url, TerminalError> {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme(), self.host()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TerminalError::InvalidEndpoint("cannot-be-a-base URL".to_string()))?;
            segments.clear();
            match target {
                SessionTarget::Pod {
                    namespace, pod, ..
                } => {
                    segments.extend(["api", "v1", "terminal", namespace.as_str(), pod.as_str(), "ws"]);
                }
                SessionTarget::Node { node } => {
                    segments.extend(["api", "v1", "node-terminal", node.as_str(), "ws"]);
                }
            }
        }
        {
            let mut query = url.query_pairs_mut();
            if let SessionTarget::Pod { container, .. } = target {
                query.append_pair("container", container);
            }
            query.append_pair("x-cluster-name", cluster);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pod() -> SessionTarget {
        SessionTarget::Pod {
            namespace: "default".into(),
            pod: "web-1".into(),
            container: "app".into(),
        }
    }

    #[test]
    fn test_secure_origin_uses_wss() {
        let config = EndpointConfig::new("https://dashboard.example.com").unwrap();
        assert_eq!(
            config.terminal_url(&pod(), "prod").unwrap().as_str(),
            "wss://dashboard.example.com/api/v1/terminal/default/web-1/ws?container=app&x-cluster-name=prod"
        );
    }

    #[test]
    fn test_plain_origin_keeps_port() {
        let config = EndpointConfig::new("http://127.0.0.1:8080").unwrap();
        let node = SessionTarget::Node { node: "node-a".into() };
        assert_eq!(
            config.terminal_url(&node, "default").unwrap().as_str(),
            "ws://127.0.0.1:8080/api/v1/node-terminal/node-a/ws?x-cluster-name=default"
        );
    }

    #[test]
    fn test_dev_host_only_applies_in_development() {
        let config = EndpointConfig::new("http://localhost:5173")
            .unwrap()
            .with_dev_host(Some("localhost:8080".into()), false);
        assert_eq!(config.host(), "localhost:5173");

        let config = config.with_dev_host(Some("localhost:8080".into()), true);
        assert_eq!(config.host(), "localhost:8080");
    }

    #[test]
    fn test_identifiers_are_encoded() {
        let config = EndpointConfig::new("https://dash.example.com").unwrap();
        let target = SessionTarget::Pod {
            namespace: "team a".into(),
            pod: "web/1".into(),
            container: "app&x".into(),
        };
        let url = config.terminal_url(&target, "c 1").unwrap();
        assert_eq!(url.path(), "/api/v1/terminal/team%20a/web%2F1/ws");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("container".to_string(), "app&x".to_string()),
                ("x-cluster-name".to_string(), "c 1".to_string()),
            ]
        );
    }

    #[test]
    fn test_origin_without_host_is_rejected() {
        assert!(EndpointConfig::new("file:///tmp/x").is_err());
        assert!(EndpointConfig::new("not a url").is_err());
    }
}
