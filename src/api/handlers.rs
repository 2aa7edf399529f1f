use crate::models::{AnalysisPayload, Dataset, DatasetMetrics, ListingRecord, Locale};
use crate::service::{aggregate, narrative::MAX_SAMPLES, parse};
use axum::{
    extract::{rejection::JsonRejection, Json, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;

const MISSING_FILE: &str = "缺少文件，请上传 Excel。";
const PARSE_FAILED: &str = "解析失败，请确认 Excel 格式后重试。";
const UPLOAD_TOO_LARGE: &str = "文件过大，请精简后重新上传。";
const MISSING_FIELDS: &str = "缺少必要字段 metrics / samples";
const INVALID_PAYLOAD: &str = "请求格式错误，请检查 metrics / samples";
const ANALYSIS_FAILED: &str = "生成分析失败，请稍后再试。";

/// 错误响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 上传响应体：标准化数据集 + 汇总指标
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub metrics: DatasetMetrics,
}

/// 市场解读请求体 (metrics / samples 缺失时返回 400 而不是反序列化错误)
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub locale: Locale,
    pub metrics: Option<DatasetMetrics>,
    pub samples: Option<Vec<ListingRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

/// 上传流读取失败：超出大小限制单独提示，其余按解析失败处理
fn upload_stream_error(status: StatusCode) -> Response {
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        UPLOAD_TOO_LARGE
    } else {
        PARSE_FAILED
    };
    error_response(status, message)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 上传 Excel：解析 + 汇总
pub async fn upload(mut multipart: Multipart) -> Response {
    let mut file = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        tracing::info!("收到上传文件 {} ({} 字节)", filename, bytes.len());
                        file = Some(bytes);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("读取上传文件失败: {}", e);
                        return upload_stream_error(e.status());
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("读取上传表单失败: {}", e);
                return upload_stream_error(e.status());
            }
        }
    }

    let Some(bytes) = file else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_FILE);
    };

    match parse(&bytes) {
        Ok(dataset) => {
            let metrics = aggregate(&dataset.records);
            let response = UploadResponse { dataset, metrics };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Upload parsing failed: {}", e);
            error_response(StatusCode::BAD_REQUEST, PARSE_FAILED)
        }
    }
}

/// 市场解读
pub async fn analyze(
    State(state): State<AppState>,
    req: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let req = match req {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!("市场解读请求体无效: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, INVALID_PAYLOAD);
        }
    };
    let (Some(metrics), Some(mut samples)) = (req.metrics, req.samples) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
    };
    samples.truncate(MAX_SAMPLES);

    let payload = AnalysisPayload {
        locale: req.locale,
        metrics,
        samples,
    };

    match state.narrative.generate(&payload).await {
        Ok(analysis) => (StatusCode::OK, Json(AnalyzeResponse { analysis })).into_response(),
        Err(e) => {
            tracing::error!("AI analysis failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED)
        }
    }
}
