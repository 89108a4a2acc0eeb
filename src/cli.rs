// ABOUTME: Command-line interface: connection overrides and the pod or node to open
// Flags override values from the config file

use crate::config::AppConfig;
use crate::terminal::target::{PodInfo, SelectionEvent, TargetSelection};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive shells into cluster pods and nodes")]
pub struct Cli {
    /// Config file (default: ~/.kube-term/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dashboard origin serving the PTY bridge
    #[arg(long, env = "KUBE_TERM_SERVER", global = true)]
    pub server: Option<String>,

    /// Active cluster name
    #[arg(long, env = "KUBE_TERM_CLUSTER", global = true)]
    pub cluster: Option<String>,

    /// Connect to DEV_HOST instead of the server's host
    #[arg(long, env = "KUBE_TERM_DEV_HOST", global = true)]
    pub dev_host: Option<String>,

    /// Development mode; enables --dev-host
    #[arg(long, global = true)]
    pub development: bool,

    #[command(subcommand)]
    pub target: TargetCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TargetCommand {
    /// Shell into a pod container
    Pod {
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Pod, optionally with its containers: NAME[:c1,c2]. Repeat to switch between pods.
        #[arg(short, long = "pod", required = true)]
        pods: Vec<String>,

        /// Container to open first
        #[arg(short, long)]
        container: Option<String>,
    },
    /// Shell into a node
    Node {
        #[arg(required = true)]
        nodes: Vec<String>,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(cluster) = &self.cluster {
            config.cluster = cluster.clone();
        }
        if let Some(dev_host) = &self.dev_host {
            config.dev_host = Some(dev_host.clone());
        }
        if self.development {
            config.development = true;
        }
    }
}

impl TargetCommand {
    /// Initial selector state, with the first pod or node picked
    pub fn selection(&self) -> TargetSelection {
        match self {
            TargetCommand::Pod {
                namespace,
                pods,
                container,
            } => {
                let pods: Vec<PodInfo> = pods.iter().map(|spec| PodInfo::parse(spec)).collect();
                let first = pods.first().map(|p| p.name.clone());
                let mut selection = TargetSelection::pods(namespace.clone(), pods);
                if let Some(first) = first {
                    selection.apply(SelectionEvent::SelectPod(first));
                }
                if let Some(container) = container {
                    selection.apply(SelectionEvent::SelectContainer(container.clone()));
                }
                selection
            }
            TargetCommand::Node { nodes } => {
                let mut selection = TargetSelection::nodes(nodes.clone());
                if let Some(first) = nodes.first() {
                    selection.apply(SelectionEvent::SelectNode(first.clone()));
                }
                selection
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::target::SessionTarget;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pod_command_resolves_selected_container() {
        let cli = Cli::try_parse_from([
            "kube-term",
            "pod",
            "-n",
            "shop",
            "--pod",
            "web-1:app,sidecar",
            "--pod",
            "web-2:app",
            "--container",
            "sidecar",
        ])
        .unwrap();

        let target = cli.target.selection().resolve().unwrap();
        assert_eq!(
            target,
            SessionTarget::Pod {
                namespace: "shop".to_string(),
                pod: "web-1".to_string(),
                container: "sidecar".to_string(),
            }
        );
    }

    #[test]
    fn test_node_command_and_overrides() {
        let cli = Cli::try_parse_from([
            "kube-term",
            "--server",
            "https://dash.example.com",
            "--cluster",
            "staging",
            "node",
            "worker-a",
            "worker-b",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server, "https://dash.example.com");
        assert_eq!(config.cluster, "staging");
        assert!(!config.development);

        let target = cli.target.selection().resolve().unwrap();
        assert_eq!(
            target,
            SessionTarget::Node {
                node: "worker-a".to_string()
            }
        );
    }

    #[test]
    fn test_pod_is_required() {
        assert!(Cli::try_parse_from(["kube-term", "pod"]).is_err());
    }
}
