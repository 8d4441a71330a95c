//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{DrawResponse, ParticipantResponse};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 页码 (默认 1)
    pub page: Option<u64>,
    /// 每页数量 (默认 20，最大 100)
    #[serde(alias = "limit")]
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self { page, per_page }
    }

    /// 页码上限保证 offset 不超过 i64::MAX（数据库 OFFSET 为有符号整数）
    pub fn get_page(&self) -> u64 {
        let max_page = i64::MAX as u64 / self.get_per_page() + 1;
        self.page.unwrap_or(1).clamp(1, max_page)
    }

    pub fn get_per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn get_offset(&self) -> u64 {
        (self.get_page() - 1) * self.get_per_page()
    }

    pub fn get_limit(&self) -> u64 {
        self.get_per_page()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    PaginatedDrawResponse = PaginatedResponse<DrawResponse>,
    PaginatedParticipantResponse = PaginatedResponse<ParticipantResponse>
)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let per_page = params.get_per_page();
        Self {
            items,
            page: params.get_page(),
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}
