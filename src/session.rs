// src/session.rs

use crate::{
    client::RobustClient,
    constants,
    error::*,
    models::api::LoginResponse,
};
use log::{debug, info, warn};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use url::Url;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// 登录流程：先取 CSRF Token 构造请求头，再提交账号密码。
pub struct Session {
    http_client: RobustClient,
    base_url: String,
}

impl Session {
    pub fn new(http_client: RobustClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, constants::edx::LOGIN_PATH)
    }

    /// 发起一次未认证请求以获得 CSRF Token；找不到时返回空字符串
    async fn initial_token(&self, url: &str) -> AppResult<String> {
        info!("正在获取初始 CSRF Token");
        // 登录页本身可能返回非 2xx，只要 Cookie 写入即可
        let _ = self.http_client.client.get(url).send().await?;
        let parsed = Url::parse(url)?;
        match self
            .http_client
            .cookie_value(&parsed, constants::edx::CSRF_COOKIE)
        {
            Some(token) => {
                info!("找到 CSRF Token");
                Ok(token)
            }
            None => {
                warn!("未找到 CSRF Token");
                Ok(String::new())
            }
        }
    }

    /// 构造后续所有请求都需要携带的请求头
    pub async fn build_headers(&self) -> AppResult<HeaderMap> {
        let homepage = self.login_url();
        let token = self.initial_token(&homepage).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded;charset=utf-8"),
        );
        if let Ok(referer) = HeaderValue::from_str(&homepage) {
            headers.insert(header::REFERER, referer);
        }
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Ok(csrf) = HeaderValue::from_str(&token) {
            headers.insert(HeaderName::from_static("x-csrftoken"), csrf);
        }
        debug!("请求头构造完成: {:?}", headers.keys().collect::<Vec<_>>());
        Ok(headers)
    }

    /// 登录并返回带认证头的客户端
    pub async fn login(&self, credentials: &Credentials) -> AppResult<RobustClient> {
        let headers = self.build_headers().await?;
        let client = self.http_client.with_headers(headers);
        info!("正在登录 Open edX 站点: {}", self.base_url);

        let resp: LoginResponse = client
            .post_form(
                &self.login_url(),
                &[
                    ("email", credentials.username.as_str()),
                    ("password", credentials.password.as_str()),
                    ("remember", "false"),
                ],
            )
            .await?;
        if !resp.success {
            return Err(AppError::AuthenticationFailed(
                resp.value
                    .unwrap_or_else(|| "Wrong Email or Password.".to_string()),
            ));
        }
        Ok(client)
    }
}
