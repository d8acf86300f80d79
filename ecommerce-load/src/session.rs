//! Simulated user: per-session scratch state plus the tasks that drive traffic.
use crate::error::RequestError;
use crate::gateway::Gateway;
use crate::payload::{
    collection_ids, id_field, Id, NewCart, NewOrder, NewProduct, NewUser, UserKind,
};
use crate::requests;
use crate::tasks::TaskKind;
use rand::seq::SliceRandom;
use reqwest::Response;
use serde_json::Value;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub const MAX_SEEDED_PRODUCTS: usize = 10;
pub const MAX_SEEDED_CATEGORIES: usize = 5;

/// One virtual user. Tasks run strictly one after another, so the state needs no locking.
#[derive(Debug, Clone)]
pub struct EcommerceUser {
    gateway: Gateway,
    user_id: Option<Id>,
    product_ids: Vec<Id>,
    category_ids: Vec<Id>,
    cart_id: Option<Id>,
    order_id: Option<Id>,
}

impl EcommerceUser {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            user_id: None,
            product_ids: vec![],
            category_ids: vec![],
            cart_id: None,
            order_id: None,
        }
    }

    pub fn user_id(&self) -> Option<&Id> {
        self.user_id.as_ref()
    }

    pub fn product_ids(&self) -> &[Id] {
        &self.product_ids
    }

    pub fn category_ids(&self) -> &[Id] {
        &self.category_ids
    }

    pub fn cart_id(&self) -> Option<&Id> {
        self.cart_id.as_ref()
    }

    pub fn order_id(&self) -> Option<&Id> {
        self.order_id.as_ref()
    }

    /// Session start hook: seeds a handful of existing product and category ids.
    ///
    /// Failures leave the corresponding list empty; the tasks depending on it become no-ops.
    pub async fn on_start(&mut self) {
        self.product_ids = match requests::list_products(&self.gateway).await {
            Ok(res) => match read_body(res).await {
                Some(body) => collection_ids(&body, "productId", MAX_SEEDED_PRODUCTS),
                None => vec![],
            },
            Err(err) => {
                warn!("Failed to load existing products: {err}");
                vec![]
            }
        };

        self.category_ids = match requests::list_categories(&self.gateway).await {
            Ok(res) => match read_body(res).await {
                Some(body) => collection_ids(&body, "categoryId", MAX_SEEDED_CATEGORIES),
                None => vec![],
            },
            Err(err) => {
                warn!("Failed to load existing categories: {err}");
                vec![]
            }
        };

        debug!(
            "Seeded {} products and {} categories",
            self.product_ids.len(),
            self.category_ids.len()
        );
    }

    pub async fn run(&mut self, task: TaskKind) {
        trace!("Running {task:?}");
        match task {
            TaskKind::ListProducts => self.list_products().await,
            TaskKind::GetProductById => self.get_product_by_id().await,
            TaskKind::ListCategories => self.list_categories().await,
            TaskKind::CreateProduct => self.create_product().await,
            TaskKind::ListUsers => self.list_users().await,
            TaskKind::CreateUser => self.create_user().await,
            TaskKind::ListOrders => self.list_orders().await,
            TaskKind::CreateOrder => self.create_order().await,
        }
    }

    pub async fn list_products(&mut self) {
        let _ = requests::list_products(&self.gateway).await;
    }

    pub async fn get_product_by_id(&mut self) {
        let Some(product_id) = self.product_ids.choose(&mut rand::thread_rng()).cloned() else {
            return;
        };

        let _ = requests::get_product(&self.gateway, &product_id).await;
    }

    pub async fn list_categories(&mut self) {
        let _ = requests::list_categories(&self.gateway).await;
    }

    pub async fn create_product(&mut self) {
        let Some(category_id) = self.category_ids.choose(&mut rand::thread_rng()).cloned() else {
            return;
        };

        let product = NewProduct::generate(category_id, &mut rand::thread_rng());
        if let Some(product_id) =
            created_id(requests::create_product(&self.gateway, &product).await, "productId").await
        {
            self.product_ids.push(product_id);
        }
    }

    pub async fn list_users(&mut self) {
        let _ = requests::list_users(&self.gateway).await;
    }

    pub async fn create_user(&mut self) {
        let user = NewUser::generate(UserKind::Performance, &mut rand::thread_rng());
        if let Some(user_id) =
            created_id(requests::create_user(&self.gateway, &user).await, "userId").await
        {
            self.user_id = Some(user_id);
        }
    }

    pub async fn list_orders(&mut self) {
        let _ = requests::list_orders(&self.gateway).await;
    }

    /// Purchase flow: user (only if this session has none yet), then cart, then order.
    ///
    /// Stops at the first step that fails. Nothing created by earlier steps is rolled back.
    pub async fn create_order(&mut self) {
        let user_id = match self.user_id.clone() {
            Some(user_id) => user_id,
            None => {
                let user = NewUser::generate(UserKind::Order, &mut rand::thread_rng());
                let res = requests::create_order_user(&self.gateway, &user).await;
                let Some(user_id) = created_id(res, "userId").await else {
                    return;
                };
                self.user_id = Some(user_id.clone());
                user_id
            }
        };

        let cart = NewCart {
            user_id: user_id.clone(),
        };
        let res = requests::create_cart(&self.gateway, &cart).await;
        let Some(cart_id) = created_id(res, "cartId").await else {
            return;
        };
        self.cart_id = Some(cart_id.clone());

        let order = NewOrder::generate(cart_id, user_id, &mut rand::thread_rng());
        if let Some(order_id) =
            created_id(requests::create_order(&self.gateway, &order).await, "orderId").await
        {
            self.order_id = Some(order_id);
        }
    }
}

async fn read_body(res: Response) -> Option<Value> {
    let url = res.url().clone();
    match res.json::<Value>().await {
        Ok(body) => Some(body),
        Err(err) => {
            warn!("Unreadable response body from {url}: {err}");
            None
        }
    }
}

/// Id of the entity a successful create call returned, if the body carries one.
async fn created_id(res: Result<Response, RequestError>, field: &str) -> Option<Id> {
    let body = read_body(res.ok()?).await?;
    let id = id_field(&body, field);
    if id.is_none() {
        warn!("Response is missing `{field}`");
    }
    id
}
