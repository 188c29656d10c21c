//! Rewriting `{timestamp:M:S}` tokens into timestamped video links.
//!
//! The model is asked to cite moments as `{timestamp:MM:SS}` or
//! `{timestamp:HH:MM:SS}`. Each token becomes a `[video](<url>?t=<seconds>)`
//! link, and every distinct link is then collapsed to a numbered placeholder
//! (`[video0]`, `[video1]`, ...) that the frontend expands.

use crate::error::{Result, ShoptalkError};
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::LazyLock;

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{timestamp:([^}]+)\}").expect("valid regex"));

static VIDEO_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[video\]\(([^)]+)\)").expect("valid regex"));

/// Convert `M:S` or `H:M:S` into total seconds.
pub fn timestamp_seconds(timestamp: &str) -> Result<u64> {
    let parts = timestamp
        .split(':')
        .map(|p| {
            p.trim()
                .parse::<u64>()
                .map_err(|_| ShoptalkError::TimestampFormat(timestamp.to_string()))
        })
        .collect::<Result<Vec<u64>>>()?;

    let total = match parts.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60).and_then(|m| m.checked_add(*seconds)),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*seconds)),
        _ => None,
    };

    total.ok_or_else(|| ShoptalkError::TimestampFormat(timestamp.to_string()))
}

/// Append a `t=<seconds>` parameter for `timestamp` to `base_url`.
pub fn combine_url_and_timestamp(base_url: &str, timestamp: &str) -> Result<String> {
    let total_seconds = timestamp_seconds(timestamp)?;
    let separator = if base_url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}t={}", base_url, separator, total_seconds))
}

/// Placeholder → URL pairs, in first-appearance order.
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoLinks(Vec<(String, String)>);

impl VideoLinks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the URL behind a placeholder such as `[video0]`.
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == placeholder)
            .map(|(_, url)| url.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    fn placeholder_for(&self, url: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, u)| u == url)
            .map(|(p, _)| p.as_str())
    }
}

impl Serialize for VideoLinks {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (placeholder, url) in &self.0 {
            map.serialize_entry(placeholder, url)?;
        }
        map.end()
    }
}

/// An answer with timestamps rewritten into placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAnswer {
    pub text: String,
    pub video_links: VideoLinks,
}

/// Rewrite timestamp tokens in `answer` against `base_url`.
///
/// Without a base URL there is nothing to link to and the answer is returned
/// unchanged.
pub fn process_answer(answer: &str, base_url: Option<&str>) -> Result<ProcessedAnswer> {
    let Some(base_url) = base_url else {
        return Ok(ProcessedAnswer {
            text: answer.to_string(),
            video_links: VideoLinks::default(),
        });
    };

    let linked = link_timestamps(answer, base_url)?;

    let mut links = VideoLinks::default();
    let mut text = String::with_capacity(linked.len());
    let mut last = 0;

    for caps in VIDEO_LINK_RE.captures_iter(&linked) {
        let (Some(whole), Some(url)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&linked[last..whole.start()]);

        let placeholder = match links.placeholder_for(url.as_str()) {
            Some(p) => p.to_string(),
            None => {
                let p = format!("[video{}]", links.len());
                links.0.push((p.clone(), url.as_str().to_string()));
                p
            }
        };
        text.push_str(&placeholder);
        last = whole.end();
    }
    text.push_str(&linked[last..]);

    Ok(ProcessedAnswer {
        text,
        video_links: links,
    })
}

fn link_timestamps(answer: &str, base_url: &str) -> Result<String> {
    let mut out = String::with_capacity(answer.len());
    let mut last = 0;

    for caps in TIMESTAMP_RE.captures_iter(answer) {
        let (Some(whole), Some(ts)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&answer[last..whole.start()]);
        out.push_str(&format!(
            "[video]({})",
            combine_url_and_timestamp(base_url, ts.as_str())?
        ));
        last = whole.end();
    }
    out.push_str(&answer[last..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.youtube.com/watch?v=abc";

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(
            combine_url_and_timestamp("https://youtu.be/abc", "1:05").unwrap(),
            "https://youtu.be/abc?t=65"
        );
    }

    #[test]
    fn test_existing_query_string() {
        assert_eq!(
            combine_url_and_timestamp(BASE, "1:05").unwrap(),
            "https://www.youtube.com/watch?v=abc&t=65"
        );
    }

    #[test]
    fn test_hours_minutes_seconds() {
        assert_eq!(timestamp_seconds("1:02:03").unwrap(), 3723);
        assert_eq!(timestamp_seconds("00:45").unwrap(), 45);
    }

    #[test]
    fn test_malformed_timestamps() {
        for bad in ["1:2:3:4", "15", "aa:10", "1:", ""] {
            assert!(
                matches!(timestamp_seconds(bad), Err(ShoptalkError::TimestampFormat(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_overflowing_timestamp_rejected() {
        for huge in ["999999999999999999:00", "18446744073709551615:59", "9999999999999999:0:0"] {
            assert!(
                matches!(timestamp_seconds(huge), Err(ShoptalkError::TimestampFormat(_))),
                "{:?} should be rejected",
                huge
            );
        }

        let err = process_answer("Jump to {timestamp:999999999999999999:00}", Some(BASE)).unwrap_err();
        assert!(matches!(err, ShoptalkError::TimestampFormat(_)));
    }

    #[test]
    fn test_process_answer_rewrites_tokens() {
        let processed = process_answer(
            "Set the fence {timestamp:1:05} then rip {timestamp:2:10}.",
            Some("https://youtu.be/abc"),
        )
        .unwrap();

        assert_eq!(processed.text, "Set the fence [video0] then rip [video1].");
        assert_eq!(processed.video_links.len(), 2);
        assert_eq!(
            processed.video_links.get("[video0]"),
            Some("https://youtu.be/abc?t=65")
        );
        assert_eq!(
            processed.video_links.get("[video1]"),
            Some("https://youtu.be/abc?t=130")
        );
    }

    #[test]
    fn test_repeated_links_collapse() {
        let processed = process_answer(
            "First {timestamp:01:05}, again {timestamp:1:05}, later {timestamp:03:00}, once more {timestamp:1:5}.",
            Some(BASE),
        )
        .unwrap();

        assert_eq!(
            processed.text,
            "First [video0], again [video0], later [video1], once more [video0]."
        );
        assert_eq!(processed.video_links.len(), 2);
    }

    #[test]
    fn test_malformed_token_fails_whole_answer() {
        let err = process_answer("See {timestamp:1:2:3:4}", Some(BASE)).unwrap_err();
        assert!(matches!(err, ShoptalkError::TimestampFormat(_)));
    }

    #[test]
    fn test_no_base_url_leaves_answer() {
        let processed = process_answer("Around {timestamp:1:05}.", None).unwrap();
        assert_eq!(processed.text, "Around {timestamp:1:05}.");
        assert!(processed.video_links.is_empty());
    }

    #[test]
    fn test_answer_without_tokens() {
        let processed = process_answer("Use a sharp blade.", Some(BASE)).unwrap();
        assert_eq!(processed.text, "Use a sharp blade.");
        assert!(processed.video_links.is_empty());
    }

    #[test]
    fn test_links_serialize_in_order() {
        let processed = process_answer(
            "{timestamp:0:01} {timestamp:0:02} {timestamp:0:03} {timestamp:0:04} {timestamp:0:05} \
             {timestamp:0:06} {timestamp:0:07} {timestamp:0:08} {timestamp:0:09} {timestamp:0:10} \
             {timestamp:0:11}",
            Some("https://youtu.be/x"),
        )
        .unwrap();

        let json = serde_json::to_string(&processed.video_links).unwrap();
        assert!(json.starts_with(r#"{"[video0]":"https://youtu.be/x?t=1","[video1]""#));
        assert!(json.ends_with(r#""[video10]":"https://youtu.be/x?t=11"}"#));
    }
}
