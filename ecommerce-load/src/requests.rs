//! One transaction per gateway call. Each is timed and recorded under its request name.
use crate::error::RequestError;
use crate::gateway::{check_status, Gateway, CARTS, CATEGORIES, ORDERS, PRODUCTS, USERS};
use crate::payload::{Id, NewCart, NewOrder, NewProduct, NewUser};
use crate::transaction;
use reqwest::Response;

#[transaction("GET Products List")]
pub async fn list_products(gateway: &Gateway) -> Result<Response, RequestError> {
    check_status(gateway.get(PRODUCTS).send().await?)
}

#[transaction("GET Product by ID")]
pub async fn get_product(gateway: &Gateway, product_id: &Id) -> Result<Response, RequestError> {
    let path = format!("{PRODUCTS}/{product_id}");
    check_status(gateway.get(&path).send().await?)
}

#[transaction("GET Categories List")]
pub async fn list_categories(gateway: &Gateway) -> Result<Response, RequestError> {
    check_status(gateway.get(CATEGORIES).send().await?)
}

#[transaction("POST Create Product")]
pub async fn create_product(
    gateway: &Gateway,
    product: &NewProduct,
) -> Result<Response, RequestError> {
    check_status(gateway.post(PRODUCTS, product).send().await?)
}

#[transaction("GET Users List")]
pub async fn list_users(gateway: &Gateway) -> Result<Response, RequestError> {
    check_status(gateway.get(USERS).send().await?)
}

#[transaction("POST Create User")]
pub async fn create_user(gateway: &Gateway, user: &NewUser) -> Result<Response, RequestError> {
    check_status(gateway.post(USERS, user).send().await?)
}

#[transaction("POST Create User (for Order)")]
pub async fn create_order_user(
    gateway: &Gateway,
    user: &NewUser,
) -> Result<Response, RequestError> {
    check_status(gateway.post(USERS, user).send().await?)
}

#[transaction("GET Orders List")]
pub async fn list_orders(gateway: &Gateway) -> Result<Response, RequestError> {
    check_status(gateway.get(ORDERS).send().await?)
}

#[transaction("POST Create Cart (for Order)")]
pub async fn create_cart(gateway: &Gateway, cart: &NewCart) -> Result<Response, RequestError> {
    check_status(gateway.post(CARTS, cart).send().await?)
}

#[transaction("POST Create Order")]
pub async fn create_order(gateway: &Gateway, order: &NewOrder) -> Result<Response, RequestError> {
    check_status(gateway.post(ORDERS, order).send().await?)
}
