use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config;
use crate::database::models::DishWithRefs;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Chat completion request failed: {0}")]
    Request(String),

    #[error("Chat completion returned no content")]
    EmptyResponse,
}

/// The two texts the model is asked to produce
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedTexts {
    #[serde(rename = "generated_text_ja", alias = "generatedTextJa")]
    pub ja: String,
    #[serde(rename = "generated_text_vi", alias = "generatedTextVi")]
    pub vi: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Render taste levels as a Japanese description on the 5-point scale,
/// e.g. "辛さ4/5、甘さ2/5". Zero/absent levels are omitted.
pub fn taste_description(
    spiciness: Option<i32>,
    saltiness: Option<i32>,
    sweetness: Option<i32>,
    sourness: Option<i32>,
) -> String {
    let parts: Vec<String> = [
        ("辛さ", spiciness),
        ("塩味", saltiness),
        ("甘さ", sweetness),
        ("酸味", sourness),
    ]
    .iter()
    .filter_map(|(label, level)| match level {
        Some(v) if *v > 0 => Some(format!("{}{}/5", label, v)),
        _ => None,
    })
    .collect();

    parts.join("、")
}

/// Build the chat prompt for a dish introduction: a Vietnamese student
/// introducing a Vietnamese dish to their Japanese teacher, in both languages.
pub fn build_introduction_prompt(dish: &DishWithRefs, context: &str) -> String {
    let taste = taste_description(
        dish.spiciness_level,
        dish.saltiness_level,
        dish.sweetness_level,
        dish.sourness_level,
    );

    format!(
        "あなたはベトナムの学生です。ベトナム料理を日本人の先生に口頭で紹介する文章を作ります。\n\
         以下の料理情報と紹介したいシーン(context)をもとに、自然な会話調で作ってください。\n\
         原材料・食べ方・カテゴリー・地域の情報があれば、紹介文の中で触れてください。\n\
         \n\
         【料理情報】\n\
         料理名: {name}\n\
         カテゴリー: {category}\n\
         地域: {region}\n\
         味の特徴: {taste}\n\
         説明文: {description}\n\
         原材料: {ingredients}\n\
         食べ方: {how_to_eat}\n\
         ※各味のレベルは5段階で表しています\n\
         {context}\n\
         \n\
         【要件】\n\
         - Return exactly one JSON object, with no extra characters\n\
         - The JSON must contain two fields:\n\
         {{\n\
           \"generated_text_ja\": \"...\",\n\
           \"generated_text_vi\": \"...\"\n\
         }}\n\
         - 日本語で80〜150文字の自然な会話調\n\
         - The Vietnamese text must be easy to understand and engaging, as if introducing the dish to a teacher\n",
        name = dish.name_japanese,
        category = dish
            .category_name_japanese
            .as_deref()
            .unwrap_or("なし"),
        region = dish.region_name_japanese.as_deref().unwrap_or("なし"),
        taste = if taste.is_empty() { "特になし" } else { &taste },
        description = dish.description_japanese.as_deref().unwrap_or("説明なし"),
        ingredients = dish.ingredients.as_deref().unwrap_or("なし"),
        how_to_eat = dish.how_to_eat.as_deref().unwrap_or("なし"),
        context = context,
    )
}

/// Strip optional markdown code fences around a model reply
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse the model output into the two texts; if the reply is not the
/// requested JSON shape, fall back to using the raw text for both languages.
pub fn parse_generated_texts(raw: &str) -> GeneratedTexts {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<GeneratedTexts>(cleaned) {
        Ok(texts) if !texts.ja.is_empty() && !texts.vi.is_empty() => texts,
        _ => GeneratedTexts {
            ja: cleaned.to_string(),
            vi: cleaned.to_string(),
        },
    }
}

/// Call the chat-completions API with the introduction prompt
pub async fn generate_introduction(
    dish: &DishWithRefs,
    context: &str,
) -> Result<GeneratedTexts, AiError> {
    let ai = &config::config().ai;
    let api_key = ai.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

    let prompt = build_introduction_prompt(dish, context);

    let body = json!({
        "model": ai.model,
        "messages": [{ "role": "user", "content": prompt }],
    });

    let url = format!("{}/chat/completions", ai.base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| AiError::Request(e.to_string()))?
        .error_for_status()
        .map_err(|e| AiError::Request(e.to_string()))?
        .json::<ChatCompletionResponse>()
        .await
        .map_err(|e| AiError::Request(e.to_string()))?;

    let content = response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .ok_or(AiError::EmptyResponse)?;

    Ok(parse_generated_texts(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taste_description_skips_zero_levels() {
        let desc = taste_description(Some(4), Some(0), None, Some(2));
        assert_eq!(desc, "辛さ4/5、酸味2/5");
    }

    #[test]
    fn taste_description_empty_when_all_absent() {
        assert_eq!(taste_description(None, None, Some(0), None), "");
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_well_formed_reply() {
        let raw = r#"```json
{"generated_text_ja": "こんにちは", "generated_text_vi": "Xin chào"}
```"#;
        let texts = parse_generated_texts(raw);
        assert_eq!(texts.ja, "こんにちは");
        assert_eq!(texts.vi, "Xin chào");
    }

    #[test]
    fn parses_camel_case_reply() {
        let raw = r#"{"generatedTextJa": "A", "generatedTextVi": "B"}"#;
        let texts = parse_generated_texts(raw);
        assert_eq!(texts.ja, "A");
        assert_eq!(texts.vi, "B");
    }

    #[test]
    fn falls_back_to_raw_text_on_malformed_reply() {
        let texts = parse_generated_texts("just a sentence");
        assert_eq!(texts.ja, "just a sentence");
        assert_eq!(texts.vi, "just a sentence");
    }
}
