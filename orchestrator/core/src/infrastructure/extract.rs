// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Markup Extraction
//
// Minimal selector helpers over provider result pages. Provider pages are
// small, flat, machine-generated HTML, so elements are located with regular
// expressions rather than a full DOM. Every miss is a `PredictionError::Parse`
// naming the selector that failed.

use regex::Regex;

use crate::domain::prediction::PredictionError;

fn compile(pattern: &str) -> Result<Regex, PredictionError> {
    Regex::new(pattern).map_err(|e| PredictionError::Parse(format!("bad selector pattern: {}", e)))
}

/// A borrowed fragment of an HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markup<'a> {
    html: &'a str,
}

impl<'a> Markup<'a> {
    pub fn new(html: &'a str) -> Self {
        Self { html }
    }

    pub fn as_str(&self) -> &'a str {
        self.html
    }

    /// Inner markup of the first `<tag>` element.
    pub fn first(&self, tag: &str) -> Result<Markup<'a>, PredictionError> {
        self.all(tag)?
            .into_iter()
            .next()
            .ok_or_else(|| PredictionError::Parse(format!("no <{}> element found", tag)))
    }

    /// Inner markup of every `<tag>` element, in document order.
    pub fn all(&self, tag: &str) -> Result<Vec<Markup<'a>>, PredictionError> {
        let tag = regex::escape(tag);
        let re = compile(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>"))?;
        Ok(re
            .captures_iter(self.html)
            .filter_map(|caps| caps.get(1))
            .map(|m| Markup::new(&self.html[m.range()]))
            .collect())
    }

    /// Everything after the opening tag of `<tag id="id">`.
    ///
    /// The closing tag is not searched for, so nested elements of the same
    /// kind do not cut the fragment short.
    pub fn by_id(&self, tag: &str, id: &str) -> Result<Markup<'a>, PredictionError> {
        let pattern = format!(
            r#"(?is)<{}\b[^>]*\bid\s*=\s*["']?{}["']?[^>]*>"#,
            regex::escape(tag),
            regex::escape(id)
        );
        let re = compile(&pattern)?;
        let open = re
            .find(self.html)
            .ok_or_else(|| PredictionError::Parse(format!("no <{} id=\"{}\"> element found", tag, id)))?;
        Ok(Markup::new(&self.html[open.end()..]))
    }

    /// Text content of every `<tag>` element.
    pub fn all_texts(&self, tag: &str) -> Result<Vec<String>, PredictionError> {
        Ok(self.all(tag)?.iter().map(Markup::text).collect())
    }

    /// Text content with tags removed and common entities decoded.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.html.len());
        let mut in_tag = false;
        for c in self.html.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        decode_entities(&out)
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
