//! Message preprocessing and candidate extraction.
//!
//! Strips regions where link syntax must be ignored (code spans, `<nowiki>`,
//! block quotes), undoes Markdown escapes, converts mobile wiki URLs and
//! interwiki emoji shortcodes back into bracket syntax, then tokenizes the
//! remaining `[[...]]` / `{{...}}` spans. Malformed bracket runs are
//! accepted here and rejected by the resolver.

use regex::Regex;
use wikilink_domain::site::SiteDescriptor;
use wikilink_domain::types::CandidateMatch;

pub struct MessageScanner {
    code_fence3: fancy_regex::Regex,
    code_fence2: fancy_regex::Regex,
    code_inline: fancy_regex::Regex,
    nowiki: Regex,
    quote_block: Regex,
    quote_line: Regex,
    emoji: Regex,
    unescape: Regex,
    spoiler: Regex,
    token: Regex,
}

impl MessageScanner {
    pub fn new() -> Self {
        Self {
            // An opening delimiter preceded by a backslash is escaped and
            // does not start a code span. 2- and 3-tick fences span
            // newlines; inline spans do not.
            code_fence3: fancy_regex::Regex::new(r"(?s)(?<!\\)```.*?```")
                .expect("static pattern"),
            code_fence2: fancy_regex::Regex::new(r"(?s)(?<!\\)``.*?``")
                .expect("static pattern"),
            code_inline: fancy_regex::Regex::new(r"(?<!\\)`[^`\n]*`").expect("static pattern"),
            nowiki: Regex::new(r"(?is)<nowiki>.*?</nowiki>").expect("static pattern"),
            quote_block: Regex::new(r"(?s)(?:^|\n)>>> .*").expect("static pattern"),
            quote_line: Regex::new(r"(?m)^> .*\n?").expect("static pattern"),
            emoji: Regex::new(r"<a?:(\w+):[0-9]+>").expect("static pattern"),
            unescape: Regex::new(r"\\([_*~`])").expect("static pattern"),
            spoiler: Regex::new(r"(?s)\|\|.*?\|\|").expect("static pattern"),
            token: Regex::new(r"(\[\[|\{\{+)([^\[\]{}|\n]+)(?:\|([^{}]*?))?(\]\]|\}\}+)")
                .expect("static pattern"),
        }
    }

    /// Extracts candidate bracket spans from a raw chat message.
    pub fn scan(&self, raw: &str, default_site: &SiteDescriptor) -> Vec<CandidateMatch> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let mut text = self.code_fence3.replace_all(raw, "").into_owned();
        text = self.code_fence2.replace_all(&text, "").into_owned();
        text = self.code_inline.replace_all(&text, "").into_owned();
        text = self.nowiki.replace_all(&text, "").into_owned();
        text = self.quote_block.replace_all(&text, "").into_owned();
        text = self.quote_line.replace_all(&text, "").into_owned();
        text = self.convert_emoji_prefixes(&text, default_site);
        text = self.unescape.replace_all(&text, "$1").into_owned();
        text = convert_mobile_links(&text, default_site);

        if !text.contains("[[") && !text.contains("{{") {
            return Vec::new();
        }

        // Spoiler-stripped copy; a candidate missing from it was hidden.
        // Over/under-matches for nested spoilers are accepted.
        let visible = self.spoiler.replace_all(&text, "").into_owned();

        self.token
            .captures_iter(&text)
            .map(|caps| {
                let raw_match = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                CandidateMatch {
                    open: caps[1].to_owned(),
                    inner: caps[2].to_owned(),
                    piped: caps.get(3).map(|m| m.as_str().to_owned()),
                    close: caps[4].to_owned(),
                    raw: raw_match.to_owned(),
                    hidden: !visible.contains(raw_match),
                }
            })
            .collect()
    }

    /// Rewrites custom-emoji shortcodes named after an interwiki prefix of
    /// the default site back into a plain `prefix:` token.
    fn convert_emoji_prefixes(&self, text: &str, site: &SiteDescriptor) -> String {
        self.emoji
            .replace_all(text, |caps: &regex::Captures| {
                let name = &caps[1];
                if site.interwiki_target(name).is_some() {
                    format!("{name}:")
                } else {
                    caps[0].to_owned()
                }
            })
            .into_owned()
    }
}

impl Default for MessageScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts plain or Markdown-wrapped mobile wiki URLs into `[[...]]`
/// syntax. URLs with query parameters other than a single `wprov` (the
/// parameter mobile share links append) are left alone.
fn convert_mobile_links(text: &str, site: &SiteDescriptor) -> String {
    let Some(mobile) = mobile_host(&site.url_pattern) else {
        return text.to_owned();
    };
    let escaped = regex::escape(&mobile);

    let Ok(markdown) = Regex::new(&format!(
        r"\[[^\]\n]*\]\(<?(https?://{escaped}/wiki/[^\s<>()]+?)>?\)"
    )) else {
        return text.to_owned();
    };
    let Ok(bare) = Regex::new(&format!(
        r"https?://{escaped}/wiki/[^\s<>()\[\]]+"
    )) else {
        return text.to_owned();
    };

    let text = markdown.replace_all(text, |caps: &regex::Captures| {
        bracketize(&caps[1]).unwrap_or_else(|| caps[0].to_owned())
    });
    bare.replace_all(&text, |caps: &regex::Captures| {
        bracketize(&caps[0]).unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

fn bracketize(url: &str) -> Option<String> {
    let path = url.split("/wiki/").nth(1)?;
    let (title, query) = match path.split_once('?') {
        Some((title, query)) => (title, Some(query)),
        None => (path, None),
    };
    if let Some(query) = query {
        if query.contains('&') || !query.starts_with("wprov=") {
            return None;
        }
    }
    if title.is_empty() {
        return None;
    }
    Some(format!("[[{title}]]"))
}

/// Guesses the mobile-subdomain host for a wiki URL pattern: `www.` becomes
/// `m.`, otherwise `.m.` is inserted after the first subdomain label. Hosts
/// without a subdomain have no recognizable mobile variant.
fn mobile_host(url_pattern: &str) -> Option<String> {
    let parsed = url::Url::parse(&url_pattern.replace("$1", "")).ok()?;
    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 {
        return None;
    }
    let mut mobile: Vec<&str> = Vec::with_capacity(labels.len() + 1);
    if labels[0].eq_ignore_ascii_case("www") {
        mobile.push("m");
        mobile.extend(&labels[1..]);
    } else {
        mobile.push(labels[0]);
        mobile.push("m");
        mobile.extend(&labels[1..]);
    }
    Some(mobile.join("."))
}
