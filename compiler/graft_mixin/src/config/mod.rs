//! Typed session configuration.
//!
//! Every recognised option is a field; there is no string-keyed lookup at
//! merge time. Environment overrides are read once, when the config is built.

/// Priority given to overlays that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Configuration for one merge session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "Config struct: each bool controls an independent flag"
)]
pub struct MixinConfig {
    /// Priority for overlays that declare none.
    pub default_priority: i32,
    /// A missing overwrite target is an error instead of a warning.
    pub require_overwrite_targets: bool,
    /// Rename non-public unique members that collide with the target.
    pub rename_conflicting_unique: bool,
    /// Warn when a handler is also tagged unique.
    pub warn_redundant_unique: bool,
    /// Run the synthetic inner class widening pass.
    pub widen_synthetic_inner: bool,
    /// Run the accessor synthesis pass.
    pub synthesize_accessors: bool,
}

impl Default for MixinConfig {
    fn default() -> Self {
        MixinConfig {
            default_priority: DEFAULT_PRIORITY,
            require_overwrite_targets: false,
            rename_conflicting_unique: true,
            warn_redundant_unique: true,
            widen_synthetic_inner: true,
            synthesize_accessors: true,
        }
    }
}

impl MixinConfig {
    /// Defaults overridden by `GRAFT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `GRAFT_*` key.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = MixinConfig::default();

        if let Some(raw) = lookup("GRAFT_DEFAULT_PRIORITY") {
            match raw.trim().parse() {
                Ok(priority) => config.default_priority = priority,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid GRAFT_DEFAULT_PRIORITY"),
            }
        }

        let flags: [(&str, &mut bool); 5] = [
            ("GRAFT_REQUIRE_OVERWRITE_TARGETS", &mut config.require_overwrite_targets),
            ("GRAFT_RENAME_CONFLICTING_UNIQUE", &mut config.rename_conflicting_unique),
            ("GRAFT_WARN_REDUNDANT_UNIQUE", &mut config.warn_redundant_unique),
            ("GRAFT_WIDEN_SYNTHETIC_INNER", &mut config.widen_synthetic_inner),
            ("GRAFT_SYNTHESIZE_ACCESSORS", &mut config.synthesize_accessors),
        ];
        for (key, slot) in flags {
            if let Some(raw) = lookup(key) {
                match parse_flag(&raw) {
                    Some(value) => *slot = value,
                    None => tracing::warn!(key, value = %raw, "ignoring invalid boolean"),
                }
            }
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
