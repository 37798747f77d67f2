//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

use super::errors::SpeechError;

/// 题目唯一标识（关系库中的整数主键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(i64);

impl QuestionId {
    pub fn new(id: i64) -> Result<Self, SpeechError> {
        if id <= 0 {
            return Err(SpeechError::InvalidQuestionId(id));
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 待合成文本
///
/// 不变量: 去掉首尾空白后非空；内容本身按原样保留（缓存 key 对空白敏感）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechText(String);

impl SpeechText {
    pub fn new(text: impl Into<String>, max_chars: usize) -> Result<Self, SpeechError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let chars = text.chars().count();
        if max_chars > 0 && chars > max_chars {
            return Err(SpeechError::TextTooLong {
                chars,
                limit: max_chars,
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// 音色参数：主音色 + 可选的第二说话人音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePair {
    primary: String,
    secondary: Option<String>,
}

impl VoicePair {
    /// 空字符串视为未提供，回退到默认值
    pub fn resolve(
        primary: Option<String>,
        secondary: Option<String>,
        default_primary: &str,
        default_secondary: Option<&str>,
    ) -> Result<Self, SpeechError> {
        let primary = primary
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_primary.to_string());
        if primary.trim().is_empty() {
            return Err(SpeechError::MissingVoice);
        }

        let secondary = secondary
            .filter(|v| !v.trim().is_empty())
            .or_else(|| default_secondary.map(str::to_string))
            .filter(|v| !v.trim().is_empty());

        Ok(Self { primary, secondary })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    pub fn is_two_speaker(&self) -> bool {
        self.secondary.is_some()
    }
}

/// 一次合成请求（每个 HTTP 调用构造一次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: SpeechText,
    pub voices: VoicePair,
    pub question_id: Option<QuestionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rejects_blank() {
        assert_eq!(SpeechText::new("", 100), Err(SpeechError::EmptyText));
        assert_eq!(SpeechText::new(" \n\t", 100), Err(SpeechError::EmptyText));
    }

    #[test]
    fn test_text_keeps_whitespace() {
        let text = SpeechText::new("  Le cœur ", 100).unwrap();
        assert_eq!(text.as_str(), "  Le cœur ");
        assert_eq!(text.char_count(), 10);
    }

    #[test]
    fn test_text_limit_counts_chars() {
        assert!(SpeechText::new("éééé", 4).is_ok());
        assert!(matches!(
            SpeechText::new("ééééé", 4),
            Err(SpeechError::TextTooLong { chars: 5, limit: 4 })
        ));
        // 0 表示不限制
        assert!(SpeechText::new("ééééé", 0).is_ok());
    }

    #[test]
    fn test_question_id_must_be_positive() {
        assert!(QuestionId::new(42).is_ok());
        assert_eq!(QuestionId::new(0), Err(SpeechError::InvalidQuestionId(0)));
        assert_eq!(QuestionId::new(-3), Err(SpeechError::InvalidQuestionId(-3)));
    }

    #[test]
    fn test_voice_pair_defaults() {
        let voices = VoicePair::resolve(None, None, "Kore", None).unwrap();
        assert_eq!(voices.primary(), "Kore");
        assert_eq!(voices.secondary(), None);
        assert!(!voices.is_two_speaker());

        let voices =
            VoicePair::resolve(Some("".into()), None, "Kore", Some("Puck")).unwrap();
        assert_eq!(voices.primary(), "Kore");
        assert_eq!(voices.secondary(), Some("Puck"));

        let voices =
            VoicePair::resolve(Some("Charon".into()), Some("Fenrir".into()), "Kore", None)
                .unwrap();
        assert_eq!(voices.primary(), "Charon");
        assert_eq!(voices.secondary(), Some("Fenrir"));
    }

    #[test]
    fn test_voice_pair_requires_primary() {
        assert_eq!(
            VoicePair::resolve(None, None, "", None),
            Err(SpeechError::MissingVoice)
        );
    }
}
