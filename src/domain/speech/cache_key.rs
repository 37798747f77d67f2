//! Cache Key - 缓存 key 解析
//!
//! 两个互不相交的命名空间，靠固定前缀区分：
//! - 题目绑定: `entity_<question_id>_<generation>`，每次合成都生成新的 generation
//! - 内容寻址: `hash_<md5>`，对 text / voice1 / voice2 的原始字节计算

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use super::errors::SpeechError;
use super::value_objects::{QuestionId, SpeechRequest, SpeechText, VoicePair};

const ENTITY_PREFIX: &str = "entity_";
const CONTENT_PREFIX: &str = "hash_";

/// md5 十六进制长度
const DIGEST_HEX_LEN: usize = 32;

/// 缓存 key 命名空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    /// 题目绑定
    Entity,
    /// 内容寻址
    Content,
}

impl KeyNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyNamespace::Entity => "entity",
            KeyNamespace::Content => "content",
        }
    }
}

/// 缓存 key
///
/// 不变量: 只包含 `[a-z0-9_]`，且以某个命名空间前缀开头，可直接用作文件名主干
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 题目绑定 key
    pub fn entity(question_id: QuestionId, generation: i64) -> Self {
        Self(format!("{}{}_{}", ENTITY_PREFIX, question_id, generation))
    }

    /// 内容寻址 key
    ///
    /// 每个字段带长度前缀，保证不同的 (text, voice1, voice2) 三元组不会拼出相同的输入
    pub fn content(text: &SpeechText, voices: &VoicePair) -> Self {
        let mut ctx = md5::Context::new();
        for field in [
            text.as_str(),
            voices.primary(),
            voices.secondary().unwrap_or(""),
        ] {
            ctx.consume((field.len() as u64).to_le_bytes());
            ctx.consume(field.as_bytes());
        }
        Self(format!("{}{:x}", CONTENT_PREFIX, ctx.compute()))
    }

    /// 解析外部存储的 key（例如题目表里的指针）
    pub fn parse(raw: &str) -> Result<Self, SpeechError> {
        let invalid = || SpeechError::InvalidCacheKey(raw.to_string());

        if let Some(rest) = raw.strip_prefix(ENTITY_PREFIX) {
            let (id, generation) = rest.split_once('_').ok_or_else(invalid)?;
            let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
            if !all_digits(id) || !all_digits(generation) {
                return Err(invalid());
            }
        } else if let Some(digest) = raw.strip_prefix(CONTENT_PREFIX) {
            let is_hex = digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
            if digest.len() != DIGEST_HEX_LEN || !is_hex {
                return Err(invalid());
            }
        } else {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn namespace(&self) -> KeyNamespace {
        if self.0.starts_with(ENTITY_PREFIX) {
            KeyNamespace::Entity
        } else {
            KeyNamespace::Content
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation 时钟
///
/// 返回毫秒时间戳，但保证严格递增：同一毫秒内的两次调用也会得到不同的值
#[derive(Debug, Default)]
pub struct GenerationClock {
    last: AtomicI64,
}

impl GenerationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Cache Key 解析器
#[derive(Debug, Default)]
pub struct CacheKeyResolver {
    clock: GenerationClock,
}

impl CacheKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为请求选择命名空间和 key
    ///
    /// 题目绑定的请求每次调用都会得到新的 key，只应在真正要合成时调用
    pub fn resolve(&self, request: &SpeechRequest) -> (KeyNamespace, CacheKey) {
        match request.question_id {
            Some(question_id) => (KeyNamespace::Entity, self.fresh_entity_key(question_id)),
            None => (
                KeyNamespace::Content,
                CacheKey::content(&request.text, &request.voices),
            ),
        }
    }

    pub fn fresh_entity_key(&self, question_id: QuestionId) -> CacheKey {
        CacheKey::entity(question_id, self.clock.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn text(s: &str) -> SpeechText {
        SpeechText::new(s, 0).unwrap()
    }

    fn voices(primary: &str, secondary: Option<&str>) -> VoicePair {
        VoicePair::resolve(
            Some(primary.to_string()),
            secondary.map(str::to_string),
            "Kore",
            None,
        )
        .unwrap()
    }

    fn request(s: &str, question_id: Option<i64>) -> SpeechRequest {
        SpeechRequest {
            text: text(s),
            voices: voices("Kore", None),
            question_id: question_id.map(|id| QuestionId::new(id).unwrap()),
        }
    }

    #[test]
    fn test_content_key_is_deterministic() {
        let a = CacheKey::content(&text("Le cœur pompe le sang"), &voices("Kore", Some("Puck")));
        let b = CacheKey::content(&text("Le cœur pompe le sang"), &voices("Kore", Some("Puck")));
        assert_eq!(a, b);
        assert_eq!(a.namespace(), KeyNamespace::Content);
        assert!(a.as_str().starts_with("hash_"));
        assert_eq!(a.as_str().len(), "hash_".len() + 32);
    }

    #[test]
    fn test_content_key_changes_with_any_input() {
        let base = CacheKey::content(&text("Le cœur"), &voices("Kore", Some("Puck")));
        let variants = [
            CacheKey::content(&text("Le cœur "), &voices("Kore", Some("Puck"))),
            CacheKey::content(&text("le cœur"), &voices("Kore", Some("Puck"))),
            CacheKey::content(&text("Le cœur"), &voices("Kora", Some("Puck"))),
            CacheKey::content(&text("Le cœur"), &voices("Kore", Some("Puc"))),
            CacheKey::content(&text("Le cœur"), &voices("Kore", None)),
        ];
        for variant in variants {
            assert_ne!(base, variant);
        }
    }

    #[test]
    fn test_content_key_field_boundaries_matter() {
        // 直接拼接会得到相同的字节串，带长度前缀后必须不同
        let a = CacheKey::content(&text("ab"), &voices("c", None));
        let b = CacheKey::content(&text("a"), &voices("bc", None));
        assert_ne!(a, b);
    }

    #[test]
    fn test_entity_keys_never_repeat() {
        let resolver = CacheKeyResolver::new();
        let question_id = QuestionId::new(7).unwrap();

        let keys: HashSet<_> = (0..1000)
            .map(|_| resolver.fresh_entity_key(question_id))
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_generation_clock_is_monotonic_across_threads() {
        let clock = std::sync::Arc::new(GenerationClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || (0..500).map(|_| clock.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            let values = handle.join().unwrap();
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            all.extend(values);
        }
        assert_eq!(all.len(), 2000);
    }

    #[test]
    fn test_resolve_picks_namespace() {
        let resolver = CacheKeyResolver::new();

        let (ns, key) = resolver.resolve(&request("Question", Some(42)));
        assert_eq!(ns, KeyNamespace::Entity);
        assert!(key.as_str().starts_with("entity_42_"));
        assert_eq!(key.namespace(), KeyNamespace::Entity);

        let (ns, key) = resolver.resolve(&request("Question", None));
        assert_eq!(ns, KeyNamespace::Content);
        assert_eq!(key, resolver.resolve(&request("Question", None)).1);
    }

    #[test]
    fn test_namespaces_do_not_overlap() {
        let entity = CacheKey::entity(QuestionId::new(1).unwrap(), 1);
        let content = CacheKey::content(&text("1"), &voices("Kore", None));
        assert_ne!(
            entity.as_str().split('_').next(),
            content.as_str().split('_').next()
        );
    }

    #[test]
    fn test_parse_round_trips_generated_keys() {
        let entity = CacheKey::entity(QuestionId::new(7).unwrap(), 111);
        assert_eq!(entity.as_str(), "entity_7_111");
        assert_eq!(CacheKey::parse("entity_7_111").unwrap(), entity);

        let content = CacheKey::content(&text("x"), &voices("Kore", None));
        assert_eq!(CacheKey::parse(content.as_str()).unwrap(), content);
    }

    #[test]
    fn test_parse_rejects_foreign_values() {
        for raw in [
            "",
            "entity_7",
            "entity_7_",
            "entity_x_1",
            "entity_7_1.wav",
            "hash_abc",
            "hash_ABCDEF0123456789ABCDEF0123456789",
            "../etc/passwd",
            "audio/entity_7_1",
        ] {
            assert!(CacheKey::parse(raw).is_err(), "accepted {raw:?}");
        }
    }
}
