use once_cell::sync::Lazy;
use regex::Regex;

/// Watch links, youtu.be short links, /embed/, /v/, /e/ and channel-style paths.
static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#)
        .expect("Invalid regex")
});

/// youtube.com/shorts/<id>
static SHORTS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"youtube\.com/shorts/([^"&?/\s]{11})"#).expect("Invalid regex"));

/// Extracts the 11-character video id from a pasted link.
/// The general pattern is tried first, then the shorts pattern.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    [&*VIDEO_URL_RE, &*SHORTS_URL_RE]
        .into_iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

/// Player URL for the video dialog.
pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}?autoplay=1")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_short_link_scenario() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, ID);
        assert_eq!(
            thumbnail_url(&id),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }

    #[test]
    fn test_short_and_long_links_agree() {
        let long_forms = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        ];
        let short = extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc").unwrap();
        for url in long_forms {
            assert_eq!(extract_video_id(url).as_deref(), Some(short.as_str()), "{url}");
        }
    }

    #[test]
    fn test_shorts_link() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            extract_video_id("  https://youtu.be/dQw4w9WgXcQ \n").as_deref(),
            Some(ID)
        );
    }

    #[test]
    fn test_non_matching_inputs() {
        for input in [
            "",
            "   ",
            "not a url",
            "https://vimeo.com/123456789",
            "https://youtu.be/short",
            "https://www.youtube.com/",
        ] {
            assert_eq!(extract_video_id(input), None, "{input:?}");
        }
    }

    #[test]
    fn test_thumbnail_is_deterministic() {
        assert_eq!(thumbnail_url(ID), thumbnail_url(ID));
        assert_ne!(thumbnail_url(ID), thumbnail_url("aaaaaaaaaaa"));
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            embed_url(ID),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1"
        );
    }
}
