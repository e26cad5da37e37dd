use std::fmt;

use serde_json::{json, Value};

use crate::{
    wire::{endpoint, ApiKeyParams, ApplicationSpec},
    Application, CallOptions, MonitoringConfig, Result, Session, Transporter, Verb,
};

#[derive(Clone)]
/// Entry point of the monitoring API.
pub struct MonitoringClient {
    transporter: Transporter,
    options: CallOptions,
}

impl fmt::Debug for MonitoringClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoringClient")
            .field("transporter", &self.transporter)
            .field("options", &self.options)
            .finish()
    }
}

impl MonitoringClient {
    /// Connects with the hosts derived from `app_id`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use validandgo_monitoring::MonitoringClient;
    ///
    /// let client = MonitoringClient::connect("my-app", "my-api-key")?;
    /// # Ok::<(), validandgo_monitoring::MonitoringError>(())
    /// ```
    pub fn connect(app_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::connect_with_config(MonitoringConfig::new(app_id, api_key)?)
    }

    /// Connects with an explicit configuration, e.g. custom hosts or timeouts.
    pub fn connect_with_config(config: MonitoringConfig) -> Result<Self> {
        Ok(Self {
            transporter: Transporter::new(config)?,
            options: CallOptions::default(),
        })
    }

    /// Connects using `VALIDANDGO_APP_ID` and `VALIDANDGO_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::connect_with_config(MonitoringConfig::from_env()?)
    }

    /// Applies call options to every request issued through this client and
    /// the applications and sessions it hands out.
    pub fn with_options(mut self, opts: CallOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn app_id(&self) -> &str {
        &self.transporter.config().app_id
    }

    /// Registers an application and returns its handle.
    pub async fn create_application(&self, spec: &ApplicationSpec) -> Result<Application> {
        self.create_application_with_options(spec, &CallOptions::default())
            .await
    }

    /// [`create_application`](Self::create_application) with per-call options
    /// layered over the client's.
    pub async fn create_application_with_options(
        &self,
        spec: &ApplicationSpec,
        options: &CallOptions,
    ) -> Result<Application> {
        let payload = json!({
            "type": "application",
            "name": spec.name,
            "label": spec.label,
            "description": spec.description,
            "prediction_type": spec.prediction_type,
            "data_input": spec.data_input,
            "data_output": spec.data_output,
            "metadata": spec.metadata,
            "params": spec.params,
        });
        let path = endpoint("applications/{}/operation", &[spec.name.as_str()]);
        self.write(Verb::Put, &path, Some(&payload), options).await?;
        Ok(self.application(&spec.name))
    }

    /// Handle on an existing application; no request is issued.
    pub fn application(&self, name: &str) -> Application {
        Application::new(self.transporter.clone(), self.options.clone(), name)
    }

    pub async fn delete_application(&self, name: &str) -> Result<Value> {
        self.delete_application_with_options(name, &CallOptions::default())
            .await
    }

    pub async fn delete_application_with_options(
        &self,
        name: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let path = endpoint("application/{}", &[name]);
        self.write(Verb::Delete, &path, None, options).await
    }

    /// Moves `src` to `dst`, overwriting `dst` if it exists.
    pub async fn move_application(&self, src: &str, dst: &str) -> Result<Value> {
        self.move_application_with_options(src, dst, &CallOptions::default())
            .await
    }

    pub async fn move_application_with_options(
        &self,
        src: &str,
        dst: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let payload = json!({ "operation": "move", "destination": dst });
        let path = endpoint("application/{}", &[src]);
        self.write(Verb::Post, &path, Some(&payload), options).await
    }

    /// Copies `src` to `dst`, optionally limited to some `scope` items.
    pub async fn copy_application(&self, src: &str, dst: &str, scope: &[&str]) -> Result<Value> {
        self.copy_application_with_options(src, dst, scope, &CallOptions::default())
            .await
    }

    pub async fn copy_application_with_options(
        &self,
        src: &str,
        dst: &str,
        scope: &[&str],
        options: &CallOptions,
    ) -> Result<Value> {
        let mut payload = json!({ "operation": "copy", "destination": dst });
        if !scope.is_empty() {
            payload["scope"] = json!(scope);
        }
        let path = endpoint("application/{}", &[src]);
        self.write(Verb::Post, &path, Some(&payload), options).await
    }

    /// Handle on a monitoring session; [`Session::start`] opens it.
    pub fn monitoring_session(&self, application_name: &str, model_name: &str) -> Session {
        Session::new(
            self.transporter.clone(),
            self.options.clone(),
            application_name,
            model_name,
        )
    }

    /// Application-level ping.
    pub async fn is_alive(&self) -> Result<Value> {
        self.is_alive_with_options(&CallOptions::default()).await
    }

    pub async fn is_alive_with_options(&self, options: &CallOptions) -> Result<Value> {
        self.read("1/isalive", options).await
    }

    /// Latest log entries; `offset` 0 is the most recent, `length` at most 1000.
    pub async fn get_logs(&self, offset: u32, length: u32, kind: &str) -> Result<Value> {
        self.get_logs_with_options(offset, length, kind, &CallOptions::default())
            .await
    }

    /// Served by the write hosts, which hold the freshest log entries.
    pub async fn get_logs_with_options(
        &self,
        offset: u32,
        length: u32,
        kind: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let options = options
            .clone()
            .query_parameter("offset", offset.to_string())
            .query_parameter("length", length.to_string())
            .query_parameter("type", kind);
        self.write(Verb::Get, "1/logs", None, &options).await
    }

    pub async fn list_api_keys(&self) -> Result<Value> {
        self.list_api_keys_with_options(&CallOptions::default()).await
    }

    pub async fn list_api_keys_with_options(&self, options: &CallOptions) -> Result<Value> {
        self.read("1/keys", options).await
    }

    pub async fn get_api_key(&self, api_key: &str) -> Result<Value> {
        self.get_api_key_with_options(api_key, &CallOptions::default())
            .await
    }

    pub async fn get_api_key_with_options(
        &self,
        api_key: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let path = endpoint("1/keys/{}", &[api_key]);
        self.read(&path, options).await
    }

    pub async fn add_api_key(&self, params: &ApiKeyParams) -> Result<Value> {
        self.add_api_key_with_options(params, &CallOptions::default())
            .await
    }

    pub async fn add_api_key_with_options(
        &self,
        params: &ApiKeyParams,
        options: &CallOptions,
    ) -> Result<Value> {
        let payload = json!(params);
        self.write(Verb::Post, "1/keys", Some(&payload), options).await
    }

    pub async fn update_api_key(&self, api_key: &str, params: &ApiKeyParams) -> Result<Value> {
        self.update_api_key_with_options(api_key, params, &CallOptions::default())
            .await
    }

    pub async fn update_api_key_with_options(
        &self,
        api_key: &str,
        params: &ApiKeyParams,
        options: &CallOptions,
    ) -> Result<Value> {
        let payload = json!(params);
        let path = endpoint("1/keys/{}", &[api_key]);
        self.write(Verb::Put, &path, Some(&payload), options).await
    }

    pub async fn delete_api_key(&self, api_key: &str) -> Result<Value> {
        self.delete_api_key_with_options(api_key, &CallOptions::default())
            .await
    }

    pub async fn delete_api_key_with_options(
        &self,
        api_key: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let path = endpoint("1/keys/{}", &[api_key]);
        self.write(Verb::Delete, &path, None, options).await
    }

    pub async fn restore_api_key(&self, api_key: &str) -> Result<Value> {
        self.restore_api_key_with_options(api_key, &CallOptions::default())
            .await
    }

    pub async fn restore_api_key_with_options(
        &self,
        api_key: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let path = endpoint("1/keys/{}/restore", &[api_key]);
        self.write(Verb::Post, &path, None, options).await
    }

    async fn read(&self, path: &str, options: &CallOptions) -> Result<Value> {
        let options = options.merged_over(&self.options);
        self.transporter.read(Verb::Get, path, None, &options).await
    }

    async fn write(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        options: &CallOptions,
    ) -> Result<Value> {
        let options = options.merged_over(&self.options);
        self.transporter.write(verb, path, payload, &options).await
    }
}
