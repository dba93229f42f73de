//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;

/// The top-level configuration parsed from `kiln.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    /// Settings that change how circuits are elaborated.
    #[serde(default)]
    pub elaborate: ElaborateConfig,
    /// Settings that control which warnings are reported.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Elaboration settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ElaborateConfig {
    /// Name of the clock port declared by every implicit-clock module.
    pub clock_port: String,
    /// Name of the reset port declared by every implicit-clock module.
    pub reset_port: String,
    /// Type of the implicit reset port.
    pub reset_kind: ResetKind,
    /// Maximum module nesting depth before elaboration is aborted.
    pub max_depth: usize,
    /// Upper bound on body-end hooks fired while closing a single module.
    pub hook_drain_limit: usize,
}

impl Default for ElaborateConfig {
    fn default() -> Self {
        Self {
            clock_port: "clock".to_string(),
            reset_port: "reset".to_string(),
            reset_kind: ResetKind::Sync,
            max_depth: 256,
            hook_drain_limit: 1024,
        }
    }
}

/// Synchronous or asynchronous implicit reset.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResetKind {
    /// Reset sampled on the clock edge (default).
    #[default]
    Sync,
    /// Reset acting independently of the clock.
    Async,
}

/// Warning settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Warn when a destination is connected more than once.
    pub warn_multiple_drivers: bool,
    /// Warn when a connection source is wider than its destination.
    pub warn_width_truncation: bool,
    /// Fail elaboration if any warning was emitted.
    pub deny_warnings: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warn_multiple_drivers: true,
            warn_width_truncation: true,
            deny_warnings: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: KilnConfig = toml::from_str("").unwrap();
        assert_eq!(config, KilnConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: KilnConfig = toml::from_str(
            r#"
[elaborate]
reset_kind = "async"
"#,
        )
        .unwrap();
        assert_eq!(config.elaborate.reset_kind, ResetKind::Async);
        assert_eq!(config.elaborate.clock_port, "clock");
        assert_eq!(config.elaborate.max_depth, 256);
        assert!(config.diagnostics.warn_multiple_drivers);
    }

    #[test]
    fn unknown_field_rejected() {
        let result: Result<KilnConfig, _> = toml::from_str(
            r#"
[elaborate]
clock_pin = "clk"
"#,
        );
        assert!(result.is_err());
    }
}
