use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Naming", inline)]
#[serde(default)]
/// How new groups are named.
pub struct NamingOptions {
    /// Fallback name for new groups.
    #[schemars(title = "Default Name")]
    pub default_name: String,
    /// Name new groups after the last selected entity.
    #[schemars(title = "Use Last Selected Name")]
    pub use_last_selected_name: bool,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            default_name: "group".to_owned(),
            use_last_selected_name: true,
        }
    }
}

impl NamingOptions {
    /// Pick a group name: an explicit non-blank name wins, then the last
    /// selected entity's name (when enabled), then the default.
    #[must_use]
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        last_selected: Option<String>,
    ) -> String {
        if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        last_selected
            .filter(|n| self.use_last_selected_name && !n.trim().is_empty())
            .unwrap_or_else(|| self.default_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_name_wins() {
        let n = NamingOptions::default();
        assert_eq!(n.resolve(Some(" chairs "), Some("leg".into())), "chairs");
    }

    #[test]
    fn blank_name_falls_back() {
        let n = NamingOptions::default();
        assert_eq!(n.resolve(Some("  "), Some("leg".into())), "leg");
        assert_eq!(n.resolve(None, None), "group");
    }

    #[test]
    fn last_selected_can_be_disabled() {
        let n = NamingOptions {
            use_last_selected_name: false,
            ..NamingOptions::default()
        };
        assert_eq!(n.resolve(None, Some("leg".into())), "group");
    }
}
