// ABOUTME: Session targets (pod container or node) and selector state
// Applies pod/container/node selection events and resolves the target to connect to

use crate::terminal::error::TerminalError;
use std::fmt;

/// What a terminal session is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    Pod {
        namespace: String,
        pod: String,
        container: String,
    },
    Node {
        node: String,
    },
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionTarget::Pod {
                namespace,
                pod,
                container,
            } => write!(f, "pod {}/{} ({})", namespace, pod, container),
            SessionTarget::Node { node } => write!(f, "node {}", node),
        }
    }
}

/// A pod offered by the selector, with its containers in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub containers: Vec<String>,
}

impl PodInfo {
    pub fn new(name: impl Into<String>, containers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            containers,
        }
    }

    /// Parse the `name[:container,container]` form used on the command line
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((name, containers)) => Self::new(
                name.trim(),
                containers
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            None => Self::new(spec.trim(), Vec::new()),
        }
    }
}

/// Events emitted by the pod/container/node selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectPod(String),
    SelectContainer(String),
    SelectNode(String),
    NextPod,
    NextContainer,
    NextNode,
}

/// Selector state: what is available and what the user picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    Pods {
        namespace: String,
        pods: Vec<PodInfo>,
        selected_pod: Option<String>,
        selected_container: Option<String>,
    },
    Nodes {
        nodes: Vec<String>,
        selected_node: Option<String>,
    },
}

impl TargetSelection {
    pub fn pods(namespace: impl Into<String>, pods: Vec<PodInfo>) -> Self {
        TargetSelection::Pods {
            namespace: namespace.into(),
            pods,
            selected_pod: None,
            selected_container: None,
        }
    }

    pub fn nodes(nodes: Vec<String>) -> Self {
        TargetSelection::Nodes {
            nodes,
            selected_node: None,
        }
    }

    /// Apply a selector event. Returns true when the selection changed.
    pub fn apply(&mut self, event: SelectionEvent) -> bool {
        let before = self.clone();
        match self {
            TargetSelection::Pods {
                pods,
                selected_pod,
                selected_container,
                ..
            } => match event {
                SelectionEvent::SelectPod(name) => {
                    Self::switch_pod(pods, selected_pod, selected_container, name);
                }
                SelectionEvent::NextPod => {
                    let current = selected_pod
                        .clone()
                        .or_else(|| pods.first().map(|p| p.name.clone()));
                    if let Some(next) = Self::next_after(pods.iter().map(|p| &p.name), current) {
                        Self::switch_pod(pods, selected_pod, selected_container, next);
                    }
                }
                SelectionEvent::SelectContainer(name) => {
                    *selected_container = Some(name);
                }
                SelectionEvent::NextContainer => {
                    let pod = selected_pod
                        .as_ref()
                        .and_then(|name| pods.iter().find(|p| &p.name == name))
                        .or_else(|| pods.first());
                    if let Some(pod) = pod {
                        let current = selected_container
                            .clone()
                            .or_else(|| pod.containers.first().cloned());
                        if let Some(next) = Self::next_after(pod.containers.iter(), current) {
                            *selected_container = Some(next);
                        }
                    }
                }
                SelectionEvent::SelectNode(_) | SelectionEvent::NextNode => {}
            },
            TargetSelection::Nodes {
                nodes,
                selected_node,
            } => match event {
                SelectionEvent::SelectNode(name) => *selected_node = Some(name),
                SelectionEvent::NextNode | SelectionEvent::NextPod => {
                    let current = selected_node.clone().or_else(|| nodes.first().cloned());
                    if let Some(next) = Self::next_after(nodes.iter(), current) {
                        *selected_node = Some(next);
                    }
                }
                _ => {}
            },
        }
        *self != before
    }

    /// Resolve the selection into a target, defaulting to the first
    /// available pod/container or node when nothing was picked
    pub fn resolve(&self) -> Result<SessionTarget, TerminalError> {
        match self {
            TargetSelection::Pods {
                namespace,
                pods,
                selected_pod,
                selected_container,
            } => {
                if namespace.is_empty() {
                    return Err(TerminalError::UnresolvedTarget("no namespace".to_string()));
                }
                let pod_name = selected_pod
                    .clone()
                    .or_else(|| pods.first().map(|p| p.name.clone()))
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| TerminalError::UnresolvedTarget("no pod selected".to_string()))?;
                let container = selected_container
                    .clone()
                    .or_else(|| {
                        pods.iter()
                            .find(|p| p.name == pod_name)
                            .and_then(|p| p.containers.first().cloned())
                    })
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        TerminalError::UnresolvedTarget(format!(
                            "no container selected for pod {}",
                            pod_name
                        ))
                    })?;
                Ok(SessionTarget::Pod {
                    namespace: namespace.clone(),
                    pod: pod_name,
                    container,
                })
            }
            TargetSelection::Nodes {
                nodes,
                selected_node,
            } => selected_node
                .clone()
                .or_else(|| nodes.first().cloned())
                .filter(|name| !name.is_empty())
                .map(|node| SessionTarget::Node { node })
                .ok_or_else(|| TerminalError::UnresolvedTarget("no node selected".to_string())),
        }
    }

    fn switch_pod(
        pods: &[PodInfo],
        selected_pod: &mut Option<String>,
        selected_container: &mut Option<String>,
        name: String,
    ) {
        // Keep the container choice when the new pod runs a container of that name
        let keeps_container = match (selected_container.as_ref(), pods.iter().find(|p| p.name == name)) {
            (Some(container), Some(pod)) => pod.containers.contains(container),
            _ => false,
        };
        if !keeps_container {
            *selected_container = None;
        }
        *selected_pod = Some(name);
    }

    fn next_after<'a>(
        items: impl Iterator<Item = &'a String>,
        current: Option<String>,
    ) -> Option<String> {
        let items: Vec<&String> = items.collect();
        if items.is_empty() {
            return None;
        }
        let index = current
            .and_then(|c| items.iter().position(|item| **item == c))
            .map(|i| (i + 1) % items.len())
            .unwrap_or(0);
        Some(items[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn web_pods() -> TargetSelection {
        TargetSelection::pods(
            "default",
            vec![
                PodInfo::new("web-1", vec!["app".into(), "sidecar".into()]),
                PodInfo::new("web-2", vec!["app".into()]),
                PodInfo::new("db-0", vec!["postgres".into()]),
            ],
        )
    }

    #[test]
    fn test_resolve_defaults_to_first_pod_and_container() {
        let target = web_pods().resolve().unwrap();
        assert_eq!(
            target,
            SessionTarget::Pod {
                namespace: "default".into(),
                pod: "web-1".into(),
                container: "app".into(),
            }
        );
    }

    #[test]
    fn test_resolve_requires_pod() {
        let selection = TargetSelection::pods("default", Vec::new());
        assert!(matches!(
            selection.resolve(),
            Err(TerminalError::UnresolvedTarget(_))
        ));
    }

    #[test]
    fn test_resolve_requires_container() {
        let selection = TargetSelection::pods("default", vec![PodInfo::new("bare", Vec::new())]);
        assert!(matches!(
            selection.resolve(),
            Err(TerminalError::UnresolvedTarget(_))
        ));
    }

    #[test]
    fn test_switching_pod_keeps_shared_container() {
        let mut selection = web_pods();
        assert!(selection.apply(SelectionEvent::SelectContainer("app".into())));
        assert!(selection.apply(SelectionEvent::SelectPod("web-2".into())));
        assert_eq!(
            selection.resolve().unwrap(),
            SessionTarget::Pod {
                namespace: "default".into(),
                pod: "web-2".into(),
                container: "app".into(),
            }
        );
    }

    #[test]
    fn test_switching_pod_resets_missing_container() {
        let mut selection = web_pods();
        selection.apply(SelectionEvent::SelectContainer("sidecar".into()));
        selection.apply(SelectionEvent::SelectPod("db-0".into()));
        match selection.resolve().unwrap() {
            SessionTarget::Pod { container, .. } => assert_eq!(container, "postgres"),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_cycling_pods_and_containers() {
        let mut selection = web_pods();
        assert!(selection.apply(SelectionEvent::NextContainer));
        match selection.resolve().unwrap() {
            SessionTarget::Pod { container, .. } => assert_eq!(container, "sidecar"),
            other => panic!("unexpected target {other:?}"),
        }

        selection.apply(SelectionEvent::NextPod);
        selection.apply(SelectionEvent::NextPod);
        selection.apply(SelectionEvent::NextPod);
        match selection.resolve().unwrap() {
            SessionTarget::Pod { pod, .. } => assert_eq!(pod, "web-1"),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_reselecting_same_pod_is_not_a_change() {
        let mut selection = web_pods();
        selection.apply(SelectionEvent::SelectPod("web-1".into()));
        assert!(!selection.apply(SelectionEvent::SelectPod("web-1".into())));
    }

    #[test]
    fn test_nodes_resolve_and_cycle() {
        let mut selection = TargetSelection::nodes(vec!["node-a".into(), "node-b".into()]);
        assert_eq!(
            selection.resolve().unwrap(),
            SessionTarget::Node { node: "node-a".into() }
        );
        selection.apply(SelectionEvent::NextNode);
        assert_eq!(
            selection.resolve().unwrap(),
            SessionTarget::Node { node: "node-b".into() }
        );
        assert!(TargetSelection::nodes(Vec::new()).resolve().is_err());
    }

    #[test]
    fn test_parse_pod_spec() {
        assert_eq!(
            PodInfo::parse("web-1:app, sidecar"),
            PodInfo::new("web-1", vec!["app".into(), "sidecar".into()])
        );
        assert_eq!(PodInfo::parse("web-2"), PodInfo::new("web-2", Vec::new()));
    }
}
