use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::fields::UNLABELED;
use crate::config::NarrativeConfig;
use crate::error::NarrativeError;
use crate::models::{AnalysisPayload, DatasetMetrics, Locale};

/// 参与提示词的样本记录上限
pub const MAX_SAMPLES: usize = 50;

const EMPTY_COMPLETION: &str = "未能生成分析，请稍后重试。";

/// 市场解读服务：调用 OpenAI 兼容的 chat/completions 接口，未配置密钥时返回本地占位分析
pub struct NarrativeService {
    client: Client,
    config: NarrativeConfig,
}

impl NarrativeService {
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn generate(&self, payload: &AnalysisPayload) -> Result<String, NarrativeError> {
        if !self.config.has_api_key() {
            tracing::warn!("未配置解读接口密钥，返回本地占位分析");
            return Ok(placeholder_narrative(&payload.metrics));
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: build_prompt(payload),
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::info!("请求市场解读: {} (model {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(EMPTY_COMPLETION);

        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn or_unlabeled(text: String) -> String {
    if text.is_empty() {
        UNLABELED.to_string()
    } else {
        text
    }
}

/// 构建 system + user 两条消息
pub fn build_prompt(payload: &AnalysisPayload) -> Vec<ChatMessage> {
    let metrics = &payload.metrics;

    let intro = match payload.locale {
        Locale::Zh => "你是地产研究分析师，请基于提供的月度成交数据给出中文市场解读。避免夸张语气，保持简洁。",
        Locale::En => "You are a real-estate research analyst. Write a concise market summary in Chinese based on the provided monthly transaction data.",
    };

    let districts = metrics
        .districts
        .iter()
        .take(4)
        .map(|d| format!("{}（¥{:.0}）", d.name, d.revenue))
        .collect::<Vec<_>>()
        .join("，");
    let products = metrics
        .product_types
        .iter()
        .take(4)
        .map(|p| format!("{}（{} 套）", p.name, p.units))
        .collect::<Vec<_>>()
        .join("，");
    let sample_projects = payload
        .samples
        .iter()
        .take(5)
        .map(|r| {
            r.project
                .as_deref()
                .or(r.district.as_deref())
                .unwrap_or("未命名项目")
        })
        .collect::<Vec<_>>()
        .join("，");

    let user = [
        format!("时间范围：{}", or_unlabeled(metrics.months.join(" / "))),
        format!(
            "累计成交套数：{:.0}，预估成交额：¥{:.0}",
            metrics.total_units, metrics.total_revenue
        ),
        format!("均价（简单平均）：¥{:.0} / ㎡", metrics.avg_price),
        format!("主力板块：{}", or_unlabeled(districts)),
        format!("主力产品：{}", or_unlabeled(products)),
        format!("样本项目：{}", sample_projects),
        "请输出三部分：1) 市场总体走势与节奏；2) 区域/产品表现亮点与风险；3) 下一步建议（如价格策略、推盘节奏、去化建议）。".to_string(),
    ]
    .join("\n");

    vec![
        ChatMessage {
            role: "system".to_string(),
            content: intro.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: user,
        },
    ]
}

/// 未配置密钥时的本地占位分析，内容只由指标决定
pub fn placeholder_narrative(metrics: &DatasetMetrics) -> String {
    [
        "未检测到 DEEPSEEK_API_KEY，使用本地占位分析：".to_string(),
        format!("• 时间覆盖：{}", or_unlabeled(metrics.months.join(" / "))),
        format!(
            "• 预估成交额：¥{:.0}，均价约 ¥{:.0} / ㎡",
            metrics.total_revenue, metrics.avg_price
        ),
        "• 请在 .env.local 填写 DEEPSEEK_API_KEY 后重试，将得到更完整的中文分析。".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategorySlice, ListingRecord};

    fn metrics() -> DatasetMetrics {
        DatasetMetrics {
            total_units: 5.0,
            total_revenue: 80000.0,
            avg_price: 15000.0,
            months: vec!["2025-01".to_string(), "2025-02".to_string()],
            districts: vec![CategorySlice {
                name: "高新".to_string(),
                units: 5.0,
                revenue: 80000.0,
            }],
            product_types: vec![CategorySlice {
                name: "高层".to_string(),
                units: 5.0,
                revenue: 80000.0,
            }],
            ..DatasetMetrics::default()
        }
    }

    fn sample(project: Option<&str>, district: Option<&str>) -> ListingRecord {
        ListingRecord {
            id: "id".to_string(),
            month: "2025-01".to_string(),
            city: None,
            district: district.map(str::to_string),
            project: project.map(str::to_string),
            product_type: None,
            avg_price: None,
            units_sold: None,
            area: None,
            revenue: None,
        }
    }

    #[test]
    fn placeholder_is_deterministic() {
        let text = placeholder_narrative(&metrics());
        assert_eq!(text, placeholder_narrative(&metrics()));
        assert!(text.contains("2025-01 / 2025-02"));
        assert!(text.contains("¥80000"));
        assert!(text.contains("¥15000 / ㎡"));
    }

    #[test]
    fn placeholder_marks_missing_months() {
        let text = placeholder_narrative(&DatasetMetrics::default());
        assert!(text.contains("时间覆盖：未标注"));
    }

    #[test]
    fn prompt_lists_top_slices_and_sample_names() {
        let payload = AnalysisPayload {
            locale: Locale::Zh,
            metrics: metrics(),
            samples: vec![
                sample(Some("云栖府"), Some("高新")),
                sample(None, Some("曲江")),
                sample(None, None),
            ],
        };

        let messages = build_prompt(&payload);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("中文市场解读"));

        let user = &messages[1].content;
        assert!(user.contains("主力板块：高新（¥80000）"));
        assert!(user.contains("主力产品：高层（5 套）"));
        assert!(user.contains("样本项目：云栖府，曲江，未命名项目"));
        assert!(user.contains("累计成交套数：5，预估成交额：¥80000"));
    }

    #[test]
    fn english_locale_switches_persona() {
        let payload = AnalysisPayload {
            locale: Locale::En,
            metrics: DatasetMetrics::default(),
            samples: Vec::new(),
        };
        let messages = build_prompt(&payload);
        assert!(messages[0].content.starts_with("You are a real-estate research analyst"));
        assert!(messages[1].content.contains("主力板块：未标注"));
    }

    #[tokio::test]
    async fn missing_key_returns_placeholder_without_network() {
        let service = NarrativeService::new(NarrativeConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..NarrativeConfig::default()
        })
        .unwrap();
        let payload = AnalysisPayload {
            locale: Locale::Zh,
            metrics: metrics(),
            samples: Vec::new(),
        };

        let text = service.generate(&payload).await.unwrap();
        assert_eq!(text, placeholder_narrative(&payload.metrics));
    }
}
