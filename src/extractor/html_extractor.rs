//! HTML标签提取器
//! 负责从HTML中提取 <script src> 和 <meta> 标签

use std::cell::RefCell;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// 提取结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractResult {
    pub script_srcs: Vec<String>,
    // (name或property小写, content)
    pub meta_tags: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct ExtractSink {
    result: RefCell<ExtractResult>,
}

impl TokenSink for ExtractSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => self.extract_script_src(&attrs),
                "meta" => self.extract_meta_tag(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl ExtractSink {
    fn extract_script_src(&self, attrs: &[Attribute]) {
        if let Some(attr) = attrs.iter().find(|attr| attr.name.local.as_ref() == "src") {
            self.result.borrow_mut().script_srcs.push(attr.value.to_string());
        }
    }

    /// name 与 property 各自产生一对，二者相同时只记录一次
    fn extract_meta_tag(&self, attrs: &[Attribute]) {
        let mut name = None;
        let mut property = None;
        let mut content = None;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => name = Some(attr.value.to_ascii_lowercase()),
                "property" => property = Some(attr.value.to_ascii_lowercase()),
                "content" => content = Some(attr.value.to_string()),
                _ => {}
            }
        }

        let Some(content) = content else {
            return;
        };
        let mut result = self.result.borrow_mut();
        if let Some(name) = &name {
            result.meta_tags.push((name.clone(), content.clone()));
        }
        if let Some(property) = property.filter(|p| Some(p) != name.as_ref()) {
            result.meta_tags.push((property, content));
        }
    }
}

/// HTML标签提取器
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// 从HTML字符串提取标签
    pub fn extract(html: &str) -> ExtractResult {
        let tokenizer = Tokenizer::new(ExtractSink::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.result.into_inner()
    }

    /// 仅提取 script src
    pub fn script_srcs(html: &str) -> Vec<String> {
        Self::extract(html).script_srcs
    }

    /// 仅提取 meta 名值对
    pub fn meta_tags(html: &str) -> Vec<(String, String)> {
        Self::extract(html).meta_tags
    }
}
