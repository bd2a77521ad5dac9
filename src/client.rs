// src/client.rs

use crate::{config::AppConfig, error::*};
use reqwest::{
    IntoUrl, Response, StatusCode,
    cookie::{CookieStore, Jar},
    header::HeaderMap,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// 所有页面抓取共用的 HTTP 客户端。
///
/// 克隆后共享连接池与 Cookie，认证头按实例保存。
#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    jar: Arc<Jar>,
    headers: HeaderMap,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let jar = Arc::new(Jar::default());
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_workers)
            .cookie_provider(jar.clone())
            .build()?;
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            jar,
            headers: HeaderMap::new(),
        })
    }

    /// 返回一个携带给定认证头的客户端
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            client: self.client.clone(),
            jar: self.jar.clone(),
            headers,
        }
    }

    /// 从 Cookie 罐中取出指定站点的某个 Cookie
    pub fn cookie_value(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.jar.cookies(url)?;
        header.to_str().ok()?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        if res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::FORBIDDEN {
            return Err(AppError::AuthenticationFailed(format!(
                "访问 '{}' 被拒绝 ({})",
                res.url(),
                res.status()
            )));
        }
        Ok(res.error_for_status()?)
    }

    pub async fn get_text<T: IntoUrl>(&self, url: T) -> AppResult<String> {
        Ok(self.get(url).await?.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned, U: IntoUrl>(&self, url: U) -> AppResult<T> {
        Ok(self.get(url).await?.json().await?)
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> AppResult<T> {
        let res = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .form(form)
            .send()
            .await?;
        Ok(res.json().await?)
    }
}
