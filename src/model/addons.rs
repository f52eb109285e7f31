//! Known cluster add-ons
//!
//! The resolver only knows a fixed catalogue of add-ons. Each entry documents
//! the Helm chart it installs, its default version and the top-level config keys
//! it understands, so configuration typos surface before anything is applied.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddonKind {
    /// Ingress controller
    IngressNginx,
    /// Certificate manager
    CertManager,
    /// GitOps controller
    ArgoCd,
    /// Service mesh
    Istio,
    ExternalDns,
}

impl AddonKind {
    /// Fixed emission order for add-on intents
    pub const ALL: [AddonKind; 5] = [
        AddonKind::IngressNginx,
        AddonKind::CertManager,
        AddonKind::ArgoCd,
        AddonKind::Istio,
        AddonKind::ExternalDns,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AddonKind::IngressNginx => "ingress-nginx",
            AddonKind::CertManager => "cert-manager",
            AddonKind::ArgoCd => "argo-cd",
            AddonKind::Istio => "istio",
            AddonKind::ExternalDns => "external-dns",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn default_version(&self) -> &'static str {
        match self {
            AddonKind::IngressNginx => "4.11.3",
            AddonKind::CertManager => "v1.16.1",
            AddonKind::ArgoCd => "7.6.12",
            AddonKind::Istio => "1.23.2",
            AddonKind::ExternalDns => "1.15.0",
        }
    }

    pub fn chart(&self) -> &'static str {
        match self {
            AddonKind::IngressNginx => "ingress-nginx",
            AddonKind::CertManager => "cert-manager",
            AddonKind::ArgoCd => "argo-cd",
            AddonKind::Istio => "istiod",
            AddonKind::ExternalDns => "external-dns",
        }
    }

    pub fn repository(&self) -> &'static str {
        match self {
            AddonKind::IngressNginx => "https://kubernetes.github.io/ingress-nginx",
            AddonKind::CertManager => "https://charts.jetstack.io",
            AddonKind::ArgoCd => "https://argoproj.github.io/argo-helm",
            AddonKind::Istio => "https://istio-release.storage.googleapis.com/charts",
            AddonKind::ExternalDns => "https://kubernetes-sigs.github.io/external-dns",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            AddonKind::IngressNginx => "ingress-nginx",
            AddonKind::CertManager => "cert-manager",
            AddonKind::ArgoCd => "argocd",
            AddonKind::Istio => "istio-system",
            AddonKind::ExternalDns => "external-dns",
        }
    }

    /// Top-level config keys the add-on accepts
    pub fn known_config_keys(&self) -> &'static [&'static str] {
        match self {
            AddonKind::IngressNginx => &[
                "replica_count",
                "service_type",
                "load_balancer_size",
                "proxy_protocol",
                "metrics_enabled",
            ],
            AddonKind::CertManager => &[
                "install_crds",
                "cluster_issuer_email",
                "cluster_issuer_server",
                "replica_count",
            ],
            AddonKind::ArgoCd => &[
                "ha_enabled",
                "server_insecure",
                "admin_enabled",
                "repositories",
            ],
            AddonKind::Istio => &["profile", "mtls_mode", "tracing_enabled", "replica_count"],
            AddonKind::ExternalDns => &[
                "provider",
                "domain_filters",
                "policy",
                "txt_owner_id",
                "interval",
            ],
        }
    }

    pub fn accepts_key(&self, key: &str) -> bool {
        self.known_config_keys().contains(&key)
    }
}

impl fmt::Display for AddonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated add-on request as given by the user
#[derive(Debug, Clone, PartialEq)]
pub struct AddonSpec {
    pub enabled: bool,
    pub version: Option<String>,
    pub config: BTreeMap<String, serde_json::Value>,
}
