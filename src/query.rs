use crate::types::{EngineRequest, SearchFilters};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// 快速搜索关键词为空
    #[error("请输入文件名或路径关键字")]
    EmptyKeyword,
    /// 高级搜索所有条件都为空
    #[error("请输入至少一个搜索条件")]
    NoCriteria,
}

/// 规范化的查询描述。构造即校验，非法查询不会流向引擎。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryDescriptor {
    Basic {
        text: String,
    },
    Advanced {
        text: String,
        filters: SearchFilters,
    },
}

impl QueryDescriptor {
    /// 快速搜索：关键词去掉首尾空白后不能为空。
    pub fn basic(text: &str) -> Result<Self, QueryError> {
        if text.trim().is_empty() {
            return Err(QueryError::EmptyKeyword);
        }
        Ok(QueryDescriptor::Basic {
            text: text.to_string(),
        })
    }

    /// 高级搜索：四个条件任填其一即可，全空才拒绝。
    /// 未填写的大小边界保持 None，让引擎知道"没有这个约束"。
    pub fn advanced(
        text: &str,
        file_type: Option<String>,
        min_size: Option<u64>,
        max_size: Option<u64>,
    ) -> Result<Self, QueryError> {
        let filters = SearchFilters {
            file_type: file_type.filter(|t| !t.trim().is_empty()),
            min_size,
            max_size,
        };
        if text.trim().is_empty() && filters.is_empty() {
            return Err(QueryError::NoCriteria);
        }
        Ok(QueryDescriptor::Advanced {
            text: text.to_string(),
            filters,
        })
    }

    /// 查询关键词 (高亮预览时复用)
    pub fn text(&self) -> &str {
        match self {
            QueryDescriptor::Basic { text } => text,
            QueryDescriptor::Advanced { text, .. } => text,
        }
    }

    pub fn to_request(&self) -> EngineRequest {
        match self {
            QueryDescriptor::Basic { text } => EngineRequest::BasicSearch {
                query: text.clone(),
            },
            QueryDescriptor::Advanced { text, filters } => EngineRequest::AdvancedSearch {
                query: text.clone(),
                filters: filters.clone(),
            },
        }
    }
}
