use crate::errors::{SearchError, SearchResult};

/// Finds every start position of a literal query within a line.
///
/// Matching is exact and case-sensitive, and overlapping: after a match the
/// search resumes one character past the match start, so `"aa"` in `"aaa"`
/// matches at 0 and 1. Positions are reported in characters, not bytes.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: String,
}

impl QueryMatcher {
    /// Creates a matcher for `query`, which must be non-empty
    pub fn new(query: impl Into<String>) -> SearchResult<Self> {
        let query = query.into();
        if query.is_empty() {
            return Err(SearchError::invalid_query("query must not be empty"));
        }
        Ok(Self { query })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the character offsets of every match in `line`, ascending
    pub fn find_in_line(&self, line: &str) -> Vec<usize> {
        let mut offsets = Vec::new();
        let mut byte_pos = 0;
        let mut char_pos = 0;

        while let Some(found) = line[byte_pos..].find(&self.query) {
            let start = byte_pos + found;
            char_pos += line[byte_pos..start].chars().count();
            offsets.push(char_pos);

            // Step one character past the match start; the query is non-empty
            // so a character always exists there.
            let step = line[start..].chars().next().map_or(1, char::len_utf8);
            byte_pos = start + step;
            char_pos += 1;
        }

        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(query: &str, line: &str) -> Vec<usize> {
        QueryMatcher::new(query).unwrap().find_in_line(line)
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(matches!(
            QueryMatcher::new(""),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_overlapping_matches() {
        assert_eq!(offsets("aa", "aaa"), vec![0, 1]);
        assert_eq!(offsets("aa", "aaaa"), vec![0, 1, 2]);
        assert_eq!(offsets("aba", "ababa"), vec![0, 2]);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(offsets("test", "Test TEST test"), vec![10]);
    }

    #[test]
    fn test_no_match() {
        assert!(offsets("needle", "haystack").is_empty());
        assert!(offsets("x", "").is_empty());
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        // Each of these characters is three bytes in UTF-8
        assert_eq!(offsets("世界", "hello 世界"), vec![6]);
        assert_eq!(offsets("b", "ééb"), vec![2]);
        assert_eq!(offsets("界界", "界界界"), vec![0, 1]);
    }

    #[test]
    fn test_matches_between_multibyte_runs() {
        assert_eq!(offsets("x", "日x本x語"), vec![1, 3]);
    }
}
