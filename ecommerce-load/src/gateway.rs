//! HTTP access to the API gateway fronting the product, user and order services.
use crate::error::{ConfigError, RequestError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use url::Url;

pub const PRODUCTS: &str = "/product-service/api/products";
pub const CATEGORIES: &str = "/product-service/api/categories";
pub const USERS: &str = "/user-service/api/users";
pub const ORDERS: &str = "/order-service/api/orders";
pub const CARTS: &str = "/order-service/api/carts";

/// Base host plus a pooled client, cheap to clone and shared by every simulated user.
#[derive(Clone, Debug)]
pub struct Gateway {
    client: Client,
    host: String,
}

impl Gateway {
    pub fn new(host: &str) -> Result<Self, ConfigError> {
        let client = Client::builder().build()?;
        Self::with_client(client, host)
    }

    pub fn with_client(client: Client, host: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(host)?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.client.post(self.url(path)).json(body)
    }
}

/// Only `200 OK` counts as a success.
pub(crate) fn check_status(res: Response) -> Result<Response, RequestError> {
    if res.status() == StatusCode::OK {
        Ok(res)
    } else {
        Err(RequestError::Status(res.status()))
    }
}
