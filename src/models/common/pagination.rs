use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

// 分页列表响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginatedResponse<T: TS> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

// 可选整数查询参数，兼容 `#[serde(flatten)]` 时的字符串值，空字符串视为未提供
pub(crate) fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawValue {
        Int(i64),
        Str(String),
    }

    match Option::<RawValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawValue::Int(v)) => Ok(Some(v)),
        Some(RawValue::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(RawValue::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_value(Unexpected::Str(&s), &"an integer")),
    }
}

impl PaginationQuery {
    /// 规范化后的页码与每页大小：page ≥ 1，size ∈ [1, 100]
    pub fn normalized(&self) -> (u64, u64) {
        (self.page.max(1) as u64, self.size.clamp(1, 100) as u64)
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(flatten)]
        pagination: PaginationQuery,
        #[serde(default, deserialize_with = "deserialize_optional_i64")]
        program_id: Option<i64>,
    }

    #[test]
    fn test_query_string_values() {
        let params = actix_web::web::Query::<Params>::from_query("page=2&size=500&program_id=7")
            .unwrap()
            .into_inner();
        assert_eq!(params.pagination.page, 2);
        assert_eq!(params.program_id, Some(7));
        assert_eq!(params.pagination.normalized(), (2, 100));
    }

    #[test]
    fn test_defaults_and_empty_values() {
        let params = actix_web::web::Query::<Params>::from_query("program_id=")
            .unwrap()
            .into_inner();
        assert_eq!(params.pagination.page, 1);
        assert_eq!(params.pagination.size, 10);
        assert_eq!(params.program_id, None);
    }

    #[test]
    fn test_non_positive_page_clamped() {
        let query = PaginationQuery { page: 0, size: 0 };
        assert_eq!(query.normalized(), (1, 1));
    }
}
