/// 可导入的表格文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Csv,
    Xlsx,
}

impl SpreadsheetKind {
    /// 根据文件名扩展名判断类型（不区分大小写）
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".xlsx") {
            Some(SpreadsheetKind::Xlsx)
        } else if lower.ends_with(".csv") {
            Some(SpreadsheetKind::Csv)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetKind::Csv => ".csv",
            SpreadsheetKind::Xlsx => ".xlsx",
        }
    }
}

/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// xlsx 必须是 ZIP 容器；csv 为纯文本，只拒绝包含 NUL 字节的内容。
pub fn validate_magic_bytes(data: &[u8], kind: SpreadsheetKind) -> bool {
    if data.is_empty() {
        return false;
    }

    match kind {
        SpreadsheetKind::Xlsx => data.starts_with(&[0x50, 0x4B, 0x03, 0x04]),
        SpreadsheetKind::Csv => !data.iter().take(4096).any(|b| *b == 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(
            SpreadsheetKind::from_filename("notas.XLSX"),
            Some(SpreadsheetKind::Xlsx)
        );
        assert_eq!(
            SpreadsheetKind::from_filename("notas.csv"),
            Some(SpreadsheetKind::Csv)
        );
        assert_eq!(SpreadsheetKind::from_filename("notas.xls"), None);
        assert_eq!(SpreadsheetKind::from_filename("notas"), None);
    }

    #[test]
    fn test_xlsx_magic() {
        let zip_header = [0x50, 0x4B, 0x03, 0x04, 0x14, 0x00];
        assert!(validate_magic_bytes(&zip_header, SpreadsheetKind::Xlsx));
        assert!(!validate_magic_bytes(b"matricula,nombre", SpreadsheetKind::Xlsx));
    }

    #[test]
    fn test_csv_text() {
        assert!(validate_magic_bytes(b"matricula,nombre\n", SpreadsheetKind::Csv));
        assert!(!validate_magic_bytes(&[0x50, 0x00, 0x03], SpreadsheetKind::Csv));
    }

    #[test]
    fn test_empty_data() {
        assert!(!validate_magic_bytes(&[], SpreadsheetKind::Csv));
        assert!(!validate_magic_bytes(&[], SpreadsheetKind::Xlsx));
    }
}
