use crate::{
    catalog::{Product, ProductService},
    error::Result,
};

/// Category shown when the route carries no category id.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

pub struct ProductListComponent {
    service: ProductService,
    products: Vec<Product>,
    current_category_id: i64,
}

impl ProductListComponent {
    pub fn new(service: ProductService) -> Self {
        Self {
            service,
            products: Vec::new(),
            current_category_id: DEFAULT_CATEGORY_ID,
        }
    }

    /// Load the products of the routed category, or of the default one.
    pub async fn list_products(&mut self, category_id: Option<i64>) -> Result<()> {
        self.current_category_id = category_id.unwrap_or(DEFAULT_CATEGORY_ID);
        self.products = self
            .service
            .get_product_list(Some(self.current_category_id))
            .await?;
        Ok(())
    }

    /// Load every product regardless of category.
    pub async fn list_all_products(&mut self) -> Result<()> {
        self.products = self.service.get_product_list(None).await?;
        Ok(())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn current_category_id(&self) -> i64 {
        self.current_category_id
    }
}
