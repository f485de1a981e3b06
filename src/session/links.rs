// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Links embedded in song memos.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

/// A link found in a memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoLink {
    /// `http://` or `https://` URL
    Web(String),
    /// Local file given as a `file:` URL
    File(PathBuf),
}

/// Opens memo links (browser, default application, ...)
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &MemoLink) -> anyhow::Result<()>;
}

/// Opener that only reports the links it is given
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLinkOpener;

impl LinkOpener for LogLinkOpener {
    fn open(&self, link: &MemoLink) -> anyhow::Result<()> {
        info!(?link, "memo link");
        Ok(())
    }
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(r#"(?i)\b(?:https?://|file:)[^\s<>"']+"#) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("memo link pattern failed to compile: {}", e);
                None
            }
        })
        .as_ref()
}

/// Extract web and file links from memo text, in order of appearance
pub fn extract_links(text: &str) -> Vec<MemoLink> {
    let Some(pattern) = link_pattern() else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for m in pattern.find_iter(text) {
        let raw = m.as_str().trim_end_matches(['.', ',', ';', ':', ')', '!', '?']);
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("file:") {
            let path = &raw["file:".len()..];
            // file:///abs/path and file:/abs/path both name /abs/path
            let path = path.strip_prefix("//").filter(|p| p.starts_with('/')).unwrap_or(path);
            if !path.is_empty() {
                links.push(MemoLink::File(PathBuf::from(path)));
            }
        } else if lower.find("://").is_some_and(|i| raw.len() > i + 3) {
            links.push(MemoLink::Web(raw.to_string()));
        }
    }
    links
}

/// Open every link of a memo; failures are logged and skipped
pub fn open_memo_links(song_name: &str, comments: &str, opener: &dyn LinkOpener) -> usize {
    let mut opened = 0;
    for link in extract_links(comments) {
        info!(song = song_name, ?link, "opening song memo link");
        match opener.open(&link) {
            Ok(()) => opened += 1,
            Err(e) => warn!(song = song_name, ?link, "could not open memo link: {:#}", e),
        }
    }
    opened
}
