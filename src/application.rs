use serde_json::{json, Value};

use crate::{
    wire::{endpoint, ModelSpec},
    CallOptions, MonitoringError, Result, Transporter, Verb,
};

/// Operations scoped to one application.
#[derive(Clone, Debug)]
pub struct Application {
    transporter: Transporter,
    options: CallOptions,
    name: String,
}

impl Application {
    pub(crate) fn new(transporter: Transporter, options: CallOptions, name: &str) -> Self {
        Self {
            transporter,
            options,
            name: name.to_owned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a model under this application.
    pub async fn add_model(&self, model: &ModelSpec) -> Result<Value> {
        self.add_model_with_options(model, &CallOptions::default())
            .await
    }

    /// [`add_model`](Self::add_model) with per-call options layered over the
    /// handle's.
    pub async fn add_model_with_options(
        &self,
        model: &ModelSpec,
        options: &CallOptions,
    ) -> Result<Value> {
        let payload = json!({
            "type": "model",
            "application_owner": self.name,
            "name": model.name,
            "label": model.label,
            "description": model.description,
            "version": model.version,
            "params": model.params,
        });
        let path = endpoint(
            "applications/{}/{}/operation",
            &[self.name.as_str(), model.name.as_str()],
        );
        let options = options.merged_over(&self.options);
        self.transporter
            .write(Verb::Put, &path, Some(&payload), &options)
            .await
    }

    pub async fn get_model(&self, model_name: &str) -> Result<Value> {
        self.get_model_with_options(model_name, &CallOptions::default())
            .await
    }

    pub async fn get_model_with_options(
        &self,
        model_name: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let path = endpoint("applications/{}/{}/operation", &[self.name.as_str(), model_name]);
        let options = options.merged_over(&self.options);
        self.transporter
            .read(Verb::Get, &path, None, &options)
            .await
    }

    pub async fn delete_model(&self, model_name: &str) -> Result<Value> {
        self.delete_model_with_options(model_name, &CallOptions::default())
            .await
    }

    pub async fn delete_model_with_options(
        &self,
        model_name: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        if model_name.trim().is_empty() {
            return Err(MonitoringError::Configuration(
                "model_name cannot be empty".to_owned(),
            ));
        }
        let path = endpoint("applications/{}/{}/delete", &[self.name.as_str(), model_name]);
        let options = options.merged_over(&self.options);
        self.transporter
            .write(Verb::Delete, &path, None, &options)
            .await
    }

    /// Lists the application's models, narrowed by optional `filters` sent as
    /// query parameters.
    pub async fn browse_models(&self, filters: &[(&str, &str)]) -> Result<Value> {
        self.browse_models_with_options(filters, &CallOptions::default())
            .await
    }

    pub async fn browse_models_with_options(
        &self,
        filters: &[(&str, &str)],
        options: &CallOptions,
    ) -> Result<Value> {
        let options = filters
            .iter()
            .fold(options.merged_over(&self.options), |options, (name, value)| {
                options.query_parameter(*name, *value)
            });
        let path = endpoint("applications/{}/models", &[self.name.as_str()]);
        self.transporter
            .read(Verb::Get, &path, None, &options)
            .await
    }
}
