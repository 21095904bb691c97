//! Config for the limits reconciliation.
use std::{num::NonZeroU32, time::Duration};

/// Key of the limits document inside the source and generated ConfigMaps.
pub const DEFAULT_CONFIGMAP_LIMITS_PATH: &str = "config.yaml";

/// Label selecting the receive StatefulSets whose ready replicas are counted.
pub const DEFAULT_STATEFULSET_LABEL: &str = "controller.limits.thanos.io=thanos-limits-controller";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required flag: --{0}")]
    Missing(&'static str),

    #[error(
        "--configmap-generated-name must differ from --configmap-name, both are {0:?}: the \
         generated ConfigMap would overwrite its own source"
    )]
    GeneratedOverwritesSource(String),
}

/// CLI config for a limits controller.
#[derive(Debug, Clone, clap::Parser)]
pub struct ControllerConfig {
    /// The previous limits configuration configmap containing the limits configuration.
    #[clap(long = "configmap-name", env = "LIMITS_CONFIGMAP_NAME", action)]
    pub configmap_name: String,

    /// The default location of the limits configuration within the ConfigMap.
    #[clap(
        long = "configmap-limits-path",
        env = "LIMITS_CONFIGMAP_LIMITS_PATH",
        default_value = DEFAULT_CONFIGMAP_LIMITS_PATH,
        action
    )]
    pub configmap_limits_path: String,

    /// The name given to the configmap containing the limits configuration.
    #[clap(
        long = "configmap-generated-name",
        env = "LIMITS_CONFIGMAP_GENERATED_NAME",
        action
    )]
    pub configmap_generated_name: String,

    /// The statefulset's label to watch by the controller.
    #[clap(
        long = "statefulset-label",
        env = "LIMITS_STATEFULSET_LABEL",
        default_value = DEFAULT_STATEFULSET_LABEL,
        action
    )]
    pub statefulset_label: String,

    /// The maximum number of active series a single receive instance can handle.
    #[clap(long = "active-series-max", env = "LIMITS_ACTIVE_SERIES_MAX", action)]
    pub active_series_max: NonZeroU32,

    /// Optional interval for periodic reconciliation (e.g. 30s, 1m). If 0, runs once and
    /// exits.
    #[clap(
        long = "interval",
        env = "LIMITS_INTERVAL",
        default_value = "0s",
        value_parser = humantime::parse_duration
    )]
    pub interval: Duration,

    /// Namespace to operate in. Defaults to the pod's namespace, then to the current
    /// kubeconfig context's namespace, then to `default`.
    #[clap(long = "namespace", env = "NAMESPACE", action)]
    pub namespace: Option<String>,
}

impl ControllerConfig {
    /// Checks the constraints clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.configmap_name.trim().is_empty() {
            return Err(ConfigError::Missing("configmap-name"));
        }
        if self.configmap_generated_name.trim().is_empty() {
            return Err(ConfigError::Missing("configmap-generated-name"));
        }
        if self.configmap_limits_path.trim().is_empty() {
            return Err(ConfigError::Missing("configmap-limits-path"));
        }
        if self.configmap_name == self.configmap_generated_name {
            return Err(ConfigError::GeneratedOverwritesSource(
                self.configmap_name.clone(),
            ));
        }
        Ok(())
    }

    /// The reconciliation period, `None` when a single cycle should run.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        (!self.interval.is_zero()).then_some(self.interval)
    }
}
