use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{order::OrderResponse, to_utc};
use crate::models::{Message, OrderStatus};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based.
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    /// Clamped to `i64::MAX`, the largest skip MongoDB accepts.
    pub fn skip(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, query: &PageQuery) -> Self {
        Self {
            total,
            page: query.page(),
            pages: total.div_ceil(query.limit()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPage {
    pub data: Vec<OrderResponse>,
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateRequest {
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            message: m.message,
            created_at: to_utc(m.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_and_clamps() {
        let query = PageQuery::default();
        assert_eq!((query.page(), query.limit(), query.skip()), (1, 50, 0));

        let query = PageQuery {
            page: Some(3),
            limit: Some(1_000),
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.skip(), 400);
    }

    #[test]
    fn huge_page_numbers_saturate() {
        let query = PageQuery {
            page: Some(u64::MAX),
            limit: Some(20),
        };
        assert_eq!(query.skip(), i64::MAX as u64);
    }

    #[test]
    fn page_meta_rounds_pages_up() {
        let query = PageQuery {
            page: Some(1),
            limit: Some(20),
        };
        assert_eq!(PageMeta::new(41, &query).pages, 3);
        assert_eq!(PageMeta::new(0, &query).pages, 0);
    }
}
