//! 成绩导入
//!
//! 上传 CSV / XLSX，逐行校验后在单个事务中写入；非法行跳过并报告。

pub mod parser;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::imports::entities::FULL_COLUMNS;
use crate::models::imports::requests::FileFormat;
use crate::models::imports::responses::GradeImportResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::services::exports::table::Table;
use crate::storage::Storage;
use crate::utils::{SpreadsheetKind, validate_magic_bytes};

pub struct ImportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ImportService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    /// 导入成绩
    pub async fn import_grades(
        &self,
        mut payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let config = &self.get_config().import;

        let (file_bytes, file_name) =
            match read_file_from_multipart(&mut payload, config.max_file_size).await {
                Ok(result) => result,
                Err(response) => return Ok(response),
            };

        let Some(kind) = SpreadsheetKind::from_filename(&file_name) else {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ImportFileTypeNotAllowed,
                "Only .csv and .xlsx files are accepted",
            )));
        };
        if !validate_magic_bytes(&file_bytes, kind) {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ImportFileTypeNotAllowed,
                format!("File content does not match the {} extension", kind.extension()),
            )));
        }

        // 解析是 CPU 密集操作
        let max_rows = config.max_rows;
        let parsed = match tokio::task::spawn_blocking(move || {
            parser::parse_spreadsheet(&file_bytes, kind, max_rows)
        })
        .await
        {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(e)) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(e.error_code(), e.message())));
            }
            Err(e) => {
                error!("Import parsing task failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        "Failed to parse the file",
                    )),
                );
            }
        };

        let invalid = parsed.invalid_rows();
        let outcome = match storage.import_grade_rows(parsed.rows).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Grade import failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Grade import failed: {e}"),
                    )),
                );
            }
        };

        let response = GradeImportResponse {
            total: parsed.total,
            imported: outcome.imported,
            duplicates: outcome.duplicates,
            invalid,
            students_created: outcome.students_created,
            subjects_created: outcome.subjects_created,
            errors: parsed.errors,
        };

        info!(
            "Imported {} from {}: {} imported, {} duplicates, {} invalid",
            kind.extension(),
            file_name,
            response.imported,
            response.duplicates,
            response.invalid
        );
        record(
            &storage,
            request,
            AuditEntry::new(
                AuditAction::Import,
                AuditEntity::Grade,
                None,
                format!(
                    "Imported {file_name}: {} grades, {} duplicates, {} invalid rows",
                    response.imported, response.duplicates, response.invalid
                ),
            ),
        )
        .await;

        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Import completed")))
    }

    /// 下载导入模板
    pub async fn download_template(&self, format: FileFormat) -> ActixResult<HttpResponse> {
        let mut table = Table::new(&FULL_COLUMNS);
        table.push(parser::TEMPLATE_EXAMPLE.iter().map(|v| (*v).into()).collect());

        table
            .into_response(format, "grade_import_template")
            .map_err(|e| {
                error!("Template generation failed: {}", e);
                actix_web::error::ErrorInternalServerError(e.message().to_string())
            })
    }
}

/// 从 multipart 中读取 file 字段，超过大小限制时提前终止
async fn read_file_from_multipart(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<(Vec<u8>, String), HttpResponse> {
    let mut file_bytes = Vec::new();
    let mut file_name = String::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ImportFileMissing,
                format!("Failed to read multipart field: {e}"),
            ))
        })?;

        if field.name() != Some("file") {
            continue;
        }

        file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| {
                HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::ImportFileMissing,
                    format!("Failed to read file data: {e}"),
                ))
            })?;
            if file_bytes.len() + data.len() > max_size {
                return Err(HttpResponse::PayloadTooLarge().json(ApiResponse::error_empty(
                    ErrorCode::PayloadTooLarge,
                    format!("File exceeds the {max_size} byte limit"),
                )));
            }
            file_bytes.extend_from_slice(&data);
        }
    }

    if file_bytes.is_empty() {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ImportFileMissing,
            "No file uploaded in field 'file'",
        )));
    }

    Ok((file_bytes, file_name))
}
