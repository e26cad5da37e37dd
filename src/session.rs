use serde_json::{json, Value};

use crate::{wire::endpoint, CallOptions, MonitoringError, Result, Transporter, Verb};

/// Records one model's predictions between [`start`](Self::start) and
/// [`stop`](Self::stop).
#[derive(Clone, Debug)]
pub struct Session {
    transporter: Transporter,
    options: CallOptions,
    application_name: String,
    model_name: String,
    id: Option<Value>,
    data_input: Value,
    data_output: Value,
    metadata: Value,
}

impl Session {
    pub(crate) fn new(
        transporter: Transporter,
        options: CallOptions,
        application_name: &str,
        model_name: &str,
    ) -> Self {
        Self {
            transporter,
            options,
            application_name: application_name.to_owned(),
            model_name: model_name.to_owned(),
            id: None,
            data_input: Value::Null,
            data_output: Value::Null,
            metadata: Value::Null,
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Identifier assigned by the service once started.
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Opens the session and keeps the identifier the service assigns.
    pub async fn start(&mut self) -> Result<Value> {
        self.start_with_options(&CallOptions::default()).await
    }

    /// [`start`](Self::start) with per-call options layered over the
    /// session's.
    pub async fn start_with_options(&mut self, options: &CallOptions) -> Result<Value> {
        let payload = json!({
            "type": "session",
            "application_name": self.application_name,
            "model_name": self.model_name,
        });
        let options = options.merged_over(&self.options);
        let response = self
            .transporter
            .write(Verb::Put, &self.path(), Some(&payload), &options)
            .await?;

        self.id = Some(match response.get("id") {
            Some(id) => id.clone(),
            None => response.clone(),
        });
        Ok(response)
    }

    /// Explanatory features observed during the session.
    pub fn set_data_input(&mut self, data: Value) {
        self.data_input = data;
    }

    /// Predictions produced during the session.
    pub fn set_data_output(&mut self, data: Value) {
        self.data_output = data;
    }

    pub fn set_metadata(&mut self, data: Value) {
        self.metadata = data;
    }

    /// Closes the session, uploading everything recorded.
    pub async fn stop(&self) -> Result<Value> {
        self.stop_with_options(&CallOptions::default()).await
    }

    pub async fn stop_with_options(&self, options: &CallOptions) -> Result<Value> {
        let id = self.id.as_ref().ok_or_else(|| {
            MonitoringError::Configuration("session has not been started".to_owned())
        })?;
        let payload = json!({
            "type": "session",
            "id": id,
            "data_input": self.data_input,
            "data_output": self.data_output,
            "metadata": self.metadata,
        });
        let options = options.merged_over(&self.options);
        self.transporter
            .write(Verb::Put, &self.path(), Some(&payload), &options)
            .await
    }

    fn path(&self) -> String {
        endpoint(
            "applications/{}/{}/sessions",
            &[self.application_name.as_str(), self.model_name.as_str()],
        )
    }
}
