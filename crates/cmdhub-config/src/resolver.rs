//! Effective language and configuration from CLI, env, project, user and locale

use crate::document::{merge_documents, ConfigDocument};
use crate::store::ConfigStore;
use cmdhub_foundation::{detect, DetectionContext};
use tracing::debug;

/// Tool-specific language override
pub const LANGUAGE_ENV_VAR: &str = "CMDHUB_LANG";

/// POSIX locale variables, consulted in this order
pub const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// The environment values the resolver cares about, captured once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub language_override: Option<String>,
    pub posix_locale: Option<String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; the first non-empty locale variable wins
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let language_override = lookup(LANGUAGE_ENV_VAR).filter(|v| !v.trim().is_empty());
        let posix_locale = LOCALE_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty());

        Self {
            language_override,
            posix_locale,
        }
    }
}

/// Outcome of resolving all configuration sources
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub language: String,
    /// Project document merged over user document
    pub document: ConfigDocument,
}

impl ResolvedConfig {
    pub fn repository_url(&self) -> Option<&str> {
        self.document.repository_url()
    }
}

/// Merges CLI/env/project/user/locale sources
///
/// Built explicitly at the composition root; holds no global state.
pub struct ConfigResolver {
    user: ConfigStore,
    project: ConfigStore,
    env: EnvSnapshot,
}

impl ConfigResolver {
    pub fn new(user: ConfigStore, project: ConfigStore, env: EnvSnapshot) -> Self {
        Self { user, project, env }
    }

    pub fn user_store(&self) -> &ConfigStore {
        &self.user
    }

    pub fn project_store(&self) -> &ConfigStore {
        &self.project
    }

    /// Effective language; never fails, defaults to `"en"`
    pub async fn resolve_language(&self, cli_flag: Option<&str>) -> String {
        self.resolve(cli_flag).await.language
    }

    pub async fn resolve(&self, cli_flag: Option<&str>) -> ResolvedConfig {
        let project = self.project.get_config().await;
        let user = self.user.get_config().await;

        let context = self.detection_context(cli_flag, project.as_ref(), user.as_ref());
        let language = detect(&context);
        let document = merge_documents(project.as_ref(), user.as_ref());

        debug!(
            language = %language,
            has_project_config = project.is_some(),
            has_user_config = user.is_some(),
            "Configuration resolved"
        );

        ResolvedConfig { language, document }
    }

    fn detection_context(
        &self,
        cli_flag: Option<&str>,
        project: Option<&ConfigDocument>,
        user: Option<&ConfigDocument>,
    ) -> DetectionContext {
        DetectionContext {
            cli_flag: cli_flag.map(str::to_string),
            env_var: self.env.language_override.clone(),
            project_config: project
                .and_then(ConfigDocument::preferred_language)
                .map(str::to_string),
            user_config: user
                .and_then(ConfigDocument::preferred_language)
                .map(str::to_string),
            posix_locale: self.env.posix_locale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdhub_test_support::MemoryFileSystem;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    fn resolver(
        project: Option<&str>,
        user: Option<&str>,
        env: EnvSnapshot,
    ) -> ConfigResolver {
        let fs = Arc::new(MemoryFileSystem::new());
        let user_store = ConfigStore::user(fs.clone(), Path::new("/home/dev"));
        let project_store = ConfigStore::project(fs.clone(), Path::new("/work/app"));
        if let Some(content) = project {
            fs.insert(project_store.path(), content);
        }
        if let Some(content) = user {
            fs.insert(user_store.path(), content);
        }
        ConfigResolver::new(user_store, project_store, env)
    }

    #[test]
    fn test_env_snapshot_locale_order() {
        let vars: HashMap<&str, &str> =
            [("LC_ALL", ""), ("LC_MESSAGES", "fr_FR.UTF-8"), ("LANG", "de_DE.UTF-8")]
                .into_iter()
                .collect();
        let env = EnvSnapshot::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(env.posix_locale.as_deref(), Some("fr_FR.UTF-8"));
        assert_eq!(env.language_override, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_env_snapshot_from_process() {
        let saved: Vec<_> = std::iter::once(LANGUAGE_ENV_VAR)
            .chain(LOCALE_ENV_VARS)
            .map(|key| (key, std::env::var(key).ok()))
            .collect();

        std::env::set_var(LANGUAGE_ENV_VAR, "pt");
        std::env::remove_var("LC_ALL");
        std::env::remove_var("LC_MESSAGES");
        std::env::set_var("LANG", "nl_NL.UTF-8");
        let env = EnvSnapshot::from_process();

        for (key, value) in saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }

        assert_eq!(env.language_override.as_deref(), Some("pt"));
        assert_eq!(env.posix_locale.as_deref(), Some("nl_NL.UTF-8"));
    }

    #[tokio::test]
    async fn test_full_precedence() {
        let env = EnvSnapshot {
            language_override: Some("fr".into()),
            posix_locale: Some("it_IT.UTF-8".into()),
        };
        let r = resolver(
            Some(r#"{"preferredLanguage":"es"}"#),
            Some(r#"{"preferredLanguage":"de"}"#),
            env.clone(),
        );
        assert_eq!(r.resolve_language(Some("ja")).await, "ja");
        assert_eq!(r.resolve_language(None).await, "fr");

        let r = resolver(
            Some(r#"{"preferredLanguage":"es"}"#),
            Some(r#"{"preferredLanguage":"de"}"#),
            EnvSnapshot {
                language_override: None,
                ..env.clone()
            },
        );
        assert_eq!(r.resolve_language(None).await, "es");

        let r = resolver(None, Some(r#"{"preferredLanguage":"de"}"#), EnvSnapshot::default());
        assert_eq!(r.resolve_language(None).await, "de");

        let r = resolver(
            None,
            None,
            EnvSnapshot {
                language_override: None,
                ..env
            },
        );
        assert_eq!(r.resolve_language(None).await, "it");

        let r = resolver(None, None, EnvSnapshot::default());
        assert_eq!(r.resolve_language(None).await, "en");
    }

    #[tokio::test]
    async fn test_invalid_project_config_falls_through_to_user() {
        let r = resolver(
            Some(r#"{"preferredLanguage":"xxxx"}"#),
            Some(r#"{"preferredLanguage":"ko"}"#),
            EnvSnapshot::default(),
        );
        assert_eq!(r.resolve_language(Some("")).await, "ko");
    }

    #[tokio::test]
    async fn test_resolve_merges_documents() {
        let r = resolver(
            Some(r#"{"repositoryURL":"https://mirror.example.com/cmds"}"#),
            Some(r#"{"repositoryURL":"https://example.com/cmds","theme":"dark"}"#),
            EnvSnapshot::default(),
        );
        let resolved = r.resolve(None).await;
        assert_eq!(resolved.repository_url(), Some("https://mirror.example.com/cmds"));
        assert_eq!(resolved.document.get("theme"), Some(&serde_json::json!("dark")));
    }
}
