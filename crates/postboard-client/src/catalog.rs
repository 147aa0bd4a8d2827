//! Product catalog reader.
//!
//! The catalog API exposes products as a Spring Data REST collection:
//! `{"_embedded": {"products": [...]}}`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::Result, rest::RestClient};

pub const DEFAULT_CATALOG_BASE: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub image_url: String,
    pub active: bool,
    pub units_in_stock: i32,
    pub date_created: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Default for Product {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            sku: String::new(),
            name: String::new(),
            description: String::new(),
            unit_price: Decimal::ZERO,
            image_url: String::new(),
            active: false,
            units_in_stock: 0,
            date_created: now,
            last_update: now,
        }
    }
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Deserialize)]
struct Embedded {
    products: Vec<Product>,
}

#[derive(Clone)]
pub struct ProductService {
    rest: RestClient,
}

impl ProductService {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    /// All products, or those of one category.
    pub async fn get_product_list(&self, category_id: Option<i64>) -> Result<Vec<Product>> {
        let path = match category_id {
            Some(id) => format!("/products/search/findByCategoryId?id={id}"),
            None => "/products".to_owned(),
        };
        let resp: GetResponse = self.rest.get(&path).await?;
        tracing::debug!(count = resp.embedded.products.len(), ?category_id, "Products loaded");
        Ok(resp.embedded.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_product_is_blank() {
        let p = Product::default();
        assert_eq!(p.id, 0);
        assert!(p.sku.is_empty() && p.name.is_empty() && p.image_url.is_empty());
        assert_eq!(p.unit_price, Decimal::ZERO);
        assert!(!p.active);
        assert_eq!(p.units_in_stock, 0);
        assert!((Utc::now() - p.date_created).num_seconds() < 5);
        assert_eq!(p.date_created, p.last_update);
    }

    #[test]
    fn reads_spring_data_payload() {
        let body = serde_json::json!({
            "_embedded": {
                "products": [{
                    "id": 7,
                    "sku": "BOOK-TECH-1000",
                    "name": "Crash Course in Python",
                    "description": "Learn Python at your own pace.",
                    "unitPrice": 14.99,
                    "imageUrl": "assets/images/products/placeholder.png",
                    "active": true,
                    "unitsInStock": 100,
                    "dateCreated": "2020-08-01T10:30:00.000+00:00",
                    "lastUpdate": "2020-08-02T08:00:00.000+00:00"
                }]
            },
            "_links": { "self": { "href": "http://localhost:8080/api/products" } }
        });
        let resp: GetResponse = serde_json::from_value(body).unwrap();
        let p = &resp.embedded.products[0];
        assert_eq!(p.id, 7);
        assert_eq!(p.unit_price, Decimal::from_str("14.99").unwrap());
        assert!(p.active);
        assert_eq!(p.units_in_stock, 100);
        assert!(p.last_update > p.date_created);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let p: Product = serde_json::from_value(serde_json::json!({ "name": "Mug" })).unwrap();
        assert_eq!(p.name, "Mug");
        assert_eq!(p.id, 0);
        assert!(!p.active);
    }
}
