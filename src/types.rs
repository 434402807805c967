use serde::{Deserialize, Serialize};

/// 引擎返回的原始记录。字段以引擎协议为准，除路径和名称外都可能缺省。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFileRecord {
    pub file_path: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_time: i64,
    #[serde(default)]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub matches: Option<Vec<String>>,
}

/// 高级搜索过滤条件。未填写的数值必须保持 null，不能退化成 0，
/// 否则引擎会把 0 当成真实下界。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub file_type: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.file_type.as_deref().map_or(true, |t| t.is_empty())
            && self.min_size.is_none()
            && self.max_size.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EngineRequest {
    BasicSearch { query: String },
    AdvancedSearch { query: String, filters: SearchFilters },
    BuildIndex { path: String },
    PreviewFile { path: String },
    HighlightContent { content: String, query: String },
    Scan,
}

/// 引擎应答信封。搜索类请求填 records，预览/高亮填 text，
/// 索引构建与扫描只看 status。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineResponse {
    Ok {
        #[serde(default)]
        records: Vec<RawFileRecord>,
        #[serde(default)]
        text: Option<String>,
    },
    Err {
        error: String,
    },
}

impl EngineResponse {
    pub fn ok_records(records: Vec<RawFileRecord>) -> Self {
        EngineResponse::Ok {
            records,
            text: None,
        }
    }

    pub fn ok_text(text: String) -> Self {
        EngineResponse::Ok {
            records: Vec::new(),
            text: Some(text),
        }
    }

    pub fn ok_unit() -> Self {
        EngineResponse::Ok {
            records: Vec::new(),
            text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_bounds_stay_null() {
        let filters = SearchFilters {
            file_type: Some("pdf".to_string()),
            min_size: None,
            max_size: None,
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["min_size"], serde_json::Value::Null);
        assert_eq!(json["max_size"], serde_json::Value::Null);
        assert_eq!(json["file_type"], "pdf");
    }

    #[test]
    fn test_minimal_record_parses() {
        let raw: RawFileRecord =
            serde_json::from_str(r#"{"file_path":"/tmp/a.txt","name":"a.txt"}"#).unwrap();
        assert_eq!(raw.size, 0);
        assert_eq!(raw.modified_time, 0);
        assert!(raw.matches.is_none());
        assert!(raw.line_number.is_none());
    }

    #[test]
    fn test_request_wire_shape() {
        let req = EngineRequest::AdvancedSearch {
            query: "report".to_string(),
            filters: SearchFilters {
                file_type: None,
                min_size: Some(1024),
                max_size: None,
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "advanced_search");
        assert_eq!(json["query"], "report");
        assert_eq!(json["filters"]["min_size"], 1024);
        assert_eq!(json["filters"]["file_type"], serde_json::Value::Null);
    }

    #[test]
    fn test_response_status_roundtrip() {
        let resp = EngineResponse::Err {
            error: "index not ready".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""status":"err""#));
        let back: EngineResponse = serde_json::from_str(&json).unwrap();
        match back {
            EngineResponse::Err { error } => assert_eq!(error, "index not ready"),
            _ => panic!("expected err status"),
        }
    }
}
