//! SoT HTTP client (spec.md §4.2, §6).

use serde::Deserialize;
use std::time::Duration;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::model::{OrgRecord, UserRecord};
use crate::sot::signing::sign;

const ORG_PATH: &str = "/api/service/datapub/rest/api/v1/org/queryDlpOrg";
const EMP_PATH: &str = "/api/service/datapub/rest/api/v1/emp/queryDlpEmp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SotEnvelope<T> {
    code: String,
    #[serde(default)]
    #[allow(dead_code)]
    message: String,
    #[serde(default)]
    data: Vec<T>,
    #[serde(default, rename = "errorMsg")]
    error_msg: String,
}

pub struct SotClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    sign: String,
}

impl SotClient {
    pub fn new(config: &AgentConfig) -> SotClient {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail with static config");

        SotClient {
            http,
            base_url: config.sot_base_url(),
            app_key: config.sot.app_key.clone(),
            sign: sign(&config.sot.app_key, &config.sot.app_key, &config.sot.app_secret),
        }
    }

    pub async fn fetch_orgs(&self) -> Result<Vec<OrgRecord>, AgentError> {
        let url = format!("{}{}?bsId={}", self.base_url, ORG_PATH, self.app_key);
        let orgs = self.fetch(&url).await?;
        tracing::info!(count = orgs.len(), "fetched organization records from SoT");
        Ok(orgs)
    }

    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, AgentError> {
        let url = format!("{}{}?bsId={}", self.base_url, EMP_PATH, self.app_key);
        let users = self.fetch(&url).await?;
        tracing::info!(count = users.len(), "fetched employee records from SoT");
        Ok(users)
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Vec<T>, AgentError> {
        let response = self
            .http
            .get(url)
            .header("appKey", &self.app_key)
            .header("sign", &self.sign)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AgentError::SoTMalformed(format!(
                "non-2xx response {}: {}",
                status, body
            )));
        }

        let envelope: SotEnvelope<T> = serde_json::from_str(&body)
            .map_err(|e| AgentError::SoTMalformed(format!("unparseable body: {} ({})", e, body)))?;

        if envelope.code != "0" && !envelope.error_msg.is_empty() {
            tracing::warn!(code = %envelope.code, error_msg = %envelope.error_msg, "SoT returned an error envelope");
        }

        Ok(envelope.data)
    }
}
