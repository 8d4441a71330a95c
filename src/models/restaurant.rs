use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::DemoBusinessConfig;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub logo_url: String,
    pub currency: String,
}

impl From<&DemoBusinessConfig> for RestaurantResponse {
    fn from(c: &DemoBusinessConfig) -> Self {
        RestaurantResponse {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
            address: c.address.clone(),
            logo_url: c.logo_url.clone(),
            currency: c.currency.clone(),
        }
    }
}

/// token 交换时附带的默认商家信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BusinessSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub logo_url: String,
}

impl From<&DemoBusinessConfig> for BusinessSummary {
    fn from(c: &DemoBusinessConfig) -> Self {
        BusinessSummary {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
            logo_url: c.logo_url.clone(),
        }
    }
}
