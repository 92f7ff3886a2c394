//! Casbin model text and the per-instance compiled model cache

use casbin::DefaultModel;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::config::RbacConfig;
use crate::error::RbacResult;

/// Reserved subject every superadmin is linked to
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// Reserved domain holding superadmin links
pub const SUPERADMIN_DOMAIN: &str = "superdomain";

const MODEL_HEAD: &str = r#"
[request_definition]
r = sub, dom, obj, act

[policy_definition]
p = sub, dom, obj, act

[role_definition]
g = _, _, _
g2 = _, _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub, r.dom) && g2(r.obj, p.obj, r.dom) && r.dom == p.dom && r.act == p.act"#;

/// Embedded model text for the given superadmin toggle
pub fn model_text(superadmin_enabled: bool) -> String {
    let mut text = MODEL_HEAD.trim_start().to_string();
    if superadmin_enabled {
        text.push_str(&format!(
            r#" || g(r.sub, "{}", "{}")"#,
            SUPERADMIN_ROLE, SUPERADMIN_DOMAIN
        ));
    }
    text.push('\n');
    text
}

/// Configuration fingerprint a compiled model is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelFingerprint {
    pub superadmin_enabled: bool,
    pub model_path: Option<PathBuf>,
}

impl From<&RbacConfig> for ModelFingerprint {
    fn from(config: &RbacConfig) -> Self {
        Self {
            superadmin_enabled: config.superadmin_enabled,
            model_path: config.model_path.clone(),
        }
    }
}

/// Compiled models, one per fingerprint, living as long as their owner
#[derive(Default)]
pub struct ModelCache {
    models: Mutex<HashMap<ModelFingerprint, DefaultModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled model for `config`, parsing it on first use
    pub async fn get(&self, config: &RbacConfig) -> RbacResult<DefaultModel> {
        let fingerprint = ModelFingerprint::from(config);
        let mut models = self.models.lock().await;

        if let Some(model) = models.get(&fingerprint) {
            return Ok(model.clone());
        }

        let model = match &fingerprint.model_path {
            Some(path) => {
                tracing::debug!("Loading casbin model from {}", path.display());
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(crate::config::ConfigError::from)?;
                DefaultModel::from_str(&text).await?
            }
            None => DefaultModel::from_str(&model_text(fingerprint.superadmin_enabled)).await?,
        };

        models.insert(fingerprint, model.clone());
        Ok(model)
    }

    pub async fn len(&self) -> usize {
        self.models.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.lock().await.is_empty()
    }
}
