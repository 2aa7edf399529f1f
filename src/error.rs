use thiserror::Error;

/// 工作簿解析错误：字节流不是可读取的表格文件
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not a readable spreadsheet: {0}")]
    Unreadable(#[from] calamine::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("empty upload")]
    Empty,
}

/// 市场解读生成错误
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Service { status: u16, body: String },
}
