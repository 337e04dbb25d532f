use sea_orm::sea_query::LikeExpr;

/// 转义 LIKE 模式中的通配符（`\` 为转义字符）
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// 构造"包含"匹配的 LIKE 表达式，用户输入中的通配符按字面匹配
pub fn contains_pattern(search: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like_pattern(search))).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("abc"), "abc");
        assert_eq!(escape_like_pattern("50%"), "50\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("c:\\dir"), "c:\\\\dir");
    }

    #[test]
    fn test_escape_keeps_unicode() {
        assert_eq!(escape_like_pattern("Núñez"), "Núñez");
    }
}
