use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::types::{BillingMethod, TokenUnit};

const EMBEDDED_CATALOG: &str = include_str!("default.toml");

/// Read-only registry of providers and their models.
///
/// Provider and model order is the order they appear in the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub providers: Vec<Provider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub token_unit: TokenUnit,
    /// Whether pay-per-token prices switch to long-context rates above the
    /// model's threshold. Models may override this.
    #[serde(default)]
    pub long_context_tiering: bool,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub references: BTreeMap<String, String>,
    #[serde(default)]
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub long_context_tiering: Option<bool>,
    #[serde(default)]
    pub pay_per_token: Option<PayPerToken>,
    #[serde(default)]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    #[serde(default)]
    pub per_call: Option<PerCall>,
}

/// Rates in USD per provider token unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPerToken {
    pub input_rate: f64,
    pub output_rate: f64,
    #[serde(default)]
    pub long_context: Option<LongContextRates>,
}

/// Rates that replace the base rates once a call's total tokens exceed
/// `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongContextRates {
    pub input_rate: f64,
    pub output_rate: f64,
    pub threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedThroughput {
    /// USD per capacity unit per hour.
    pub hourly_rate: f64,
    pub max_input_tpm_per_unit: u64,
    /// Input-token weight of one output token.
    pub output_token_ratio: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerCall {
    pub rate: f64,
    #[serde(default)]
    pub description: String,
}

impl Model {
    pub fn supports(&self, method: BillingMethod) -> bool {
        match method {
            BillingMethod::PayPerToken => self.pay_per_token.is_some(),
            BillingMethod::ProvisionedThroughput => self.provisioned_throughput.is_some(),
            BillingMethod::PerCall => self.per_call.is_some(),
        }
    }

    pub fn methods(&self) -> Vec<BillingMethod> {
        BillingMethod::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }
}

impl Provider {
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Long-context tiering for `model`, honouring its override.
    pub fn tiering_for(&self, model: &Model) -> bool {
        model
            .long_context_tiering
            .unwrap_or(self.long_context_tiering)
    }

    /// Billing methods offered by at least one of this provider's models.
    pub fn supported_methods(&self) -> Vec<BillingMethod> {
        BillingMethod::ALL
            .into_iter()
            .filter(|m| self.models.iter().any(|model| model.supports(*m)))
            .collect()
    }
}

impl Catalog {
    /// The pricing snapshot compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml_str(EMBEDDED_CATALOG)
    }

    /// Load a catalog file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let data = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&data)?
        } else {
            Self::from_toml_str(&data)?
        };

        info!(
            "Loaded catalog {} ({} providers, {} models)",
            path.display(),
            catalog.providers.len(),
            catalog.model_count()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(data)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(data: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(data)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut providers = HashSet::new();
        for provider in &self.providers {
            if !providers.insert(provider.name.as_str()) {
                return Err(CatalogError::DuplicateProvider(provider.name.clone()));
            }

            let mut models = HashSet::new();
            for model in &provider.models {
                if !models.insert(model.name.as_str()) {
                    return Err(CatalogError::DuplicateModel {
                        provider: provider.name.clone(),
                        model: model.name.clone(),
                    });
                }
                validate_model(provider, model)?;
            }
        }

        debug!(
            "Catalog validated: {} providers, {} models",
            self.providers.len(),
            self.model_count()
        );
        Ok(())
    }

    pub fn model_count(&self) -> usize {
        self.providers.iter().map(|p| p.models.len()).sum()
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn model(&self, provider: &str, model: &str) -> Option<(&Provider, &Model)> {
        let p = self.provider(provider)?;
        Some((p, p.model(model)?))
    }

    pub fn list_providers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    /// Model names for `provider`; empty if the provider is unknown.
    pub fn list_models(&self, provider: &str) -> Vec<&str> {
        self.provider(provider)
            .map(|p| p.models.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Methods offered by any model of `provider`; empty if unknown.
    pub fn list_supported_methods(&self, provider: &str) -> Vec<BillingMethod> {
        self.provider(provider)
            .map(Provider::supported_methods)
            .unwrap_or_default()
    }
}

fn validate_model(provider: &Provider, model: &Model) -> Result<(), CatalogError> {
    let check = |field: &'static str, value: f64| {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(CatalogError::InvalidRate {
                provider: provider.name.clone(),
                model: model.name.clone(),
                field,
                value,
            })
        }
    };

    if let Some(ppt) = &model.pay_per_token {
        check("input_rate", ppt.input_rate)?;
        check("output_rate", ppt.output_rate)?;
        if let Some(lc) = &ppt.long_context {
            check("long_context.input_rate", lc.input_rate)?;
            check("long_context.output_rate", lc.output_rate)?;
        }
    }

    if let Some(ptu) = &model.provisioned_throughput {
        check("hourly_rate", ptu.hourly_rate)?;
        check("output_token_ratio", ptu.output_token_ratio)?;
        if ptu.max_input_tpm_per_unit == 0 {
            return Err(CatalogError::ZeroThroughput {
                provider: provider.name.clone(),
                model: model.name.clone(),
            });
        }
    }

    if let Some(pc) = &model.per_call {
        check("per_call.rate", pc.rate)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[[providers]]
name = "Acme"
token_unit = 1000000

[[providers.models]]
name = "fast"
[providers.models.pay_per_token]
input_rate = 1.0
output_rate = 2.0

[[providers.models]]
name = "slow"
[providers.models.per_call]
rate = 0.01
"#;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(
            catalog.list_providers(),
            vec!["Azure OpenAI", "Anthropic", "Google Vertex AI"]
        );
        assert_eq!(catalog.model_count(), 17);
    }

    #[test]
    fn embedded_capability_flags() {
        let catalog = Catalog::embedded().unwrap();
        let azure = catalog.provider("Azure OpenAI").unwrap();
        assert_eq!(azure.token_unit, TokenUnit::Thousand);
        assert!(!azure.long_context_tiering);

        let vertex = catalog.provider("Google Vertex AI").unwrap();
        assert_eq!(vertex.token_unit, TokenUnit::Million);
        assert!(vertex.long_context_tiering);
    }

    #[test]
    fn list_models_preserves_file_order() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        assert_eq!(catalog.list_models("Acme"), vec!["fast", "slow"]);
        assert!(catalog.list_models("Nobody").is_empty());
    }

    #[test]
    fn supported_methods_are_provider_wide() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        assert_eq!(
            catalog.list_supported_methods("Acme"),
            vec![BillingMethod::PayPerToken, BillingMethod::PerCall]
        );
        assert!(catalog.list_supported_methods("Nobody").is_empty());

        let (_, fast) = catalog.model("Acme", "fast").unwrap();
        assert_eq!(fast.methods(), vec![BillingMethod::PayPerToken]);
    }

    #[test]
    fn embedded_methods_per_provider() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(
            catalog.list_supported_methods("Azure OpenAI"),
            vec![
                BillingMethod::PayPerToken,
                BillingMethod::ProvisionedThroughput
            ]
        );
        assert_eq!(
            catalog.list_supported_methods("Anthropic"),
            vec![BillingMethod::PayPerToken, BillingMethod::PerCall]
        );
    }

    #[test]
    fn model_override_beats_provider_flag() {
        let data = r#"
[[providers]]
name = "Acme"
token_unit = 1000000
long_context_tiering = true

[[providers.models]]
name = "flat"
long_context_tiering = false

[[providers.models]]
name = "tiered"
"#;
        let catalog = Catalog::from_toml_str(data).unwrap();
        let p = catalog.provider("Acme").unwrap();
        assert!(!p.tiering_for(p.model("flat").unwrap()));
        assert!(p.tiering_for(p.model("tiered").unwrap()));
    }

    #[test]
    fn rejects_duplicates() {
        let data = format!("{SMALL}\n[[providers]]\nname = \"Acme\"\ntoken_unit = 1000\n");
        assert!(matches!(
            Catalog::from_toml_str(&data),
            Err(CatalogError::DuplicateProvider(name)) if name == "Acme"
        ));

        let data = format!("{SMALL}\n[[providers.models]]\nname = \"fast\"\n");
        assert!(matches!(
            Catalog::from_toml_str(&data),
            Err(CatalogError::DuplicateModel { .. })
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        let data = r#"
[[providers]]
name = "Acme"
token_unit = 1000

[[providers.models]]
name = "m"
[providers.models.provisioned_throughput]
hourly_rate = 1.0
max_input_tpm_per_unit = 0
output_token_ratio = 3.0
"#;
        assert!(matches!(
            Catalog::from_toml_str(data),
            Err(CatalogError::ZeroThroughput { .. })
        ));

        let data = r#"
[[providers]]
name = "Acme"
token_unit = 1000

[[providers.models]]
name = "m"
[providers.models.per_call]
rate = -0.5
"#;
        assert!(matches!(
            Catalog::from_toml_str(data),
            Err(CatalogError::InvalidRate { field: "per_call.rate", .. })
        ));
    }

    #[test]
    fn rejects_unknown_token_unit() {
        let data = "[[providers]]\nname = \"Acme\"\ntoken_unit = 100\n";
        assert!(matches!(
            Catalog::from_toml_str(data),
            Err(CatalogError::Toml(_))
        ));
    }

    #[test]
    fn loads_json_and_toml_files() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("catalog.toml");
        fs::write(&toml_path, SMALL).unwrap();
        let from_toml = Catalog::from_path(&toml_path).unwrap();

        let json_path = dir.path().join("catalog.json");
        fs::write(&json_path, serde_json::to_string(&from_toml).unwrap()).unwrap();
        let from_json = Catalog::from_path(&json_path).unwrap();

        assert_eq!(from_json.list_models("Acme"), from_toml.list_models("Acme"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
