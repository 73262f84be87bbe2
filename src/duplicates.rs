//! Detection of copy entries sharing a `(slug, language)` key.
//!
//! Detection only reports; choosing which member to keep is left to an
//! operator, which is why every member's id, text and creation time is kept.

use crate::models::CopyEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One member of a duplicate group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDetail {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Copy entries sharing one `(slug, language)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub slug: String,
    pub language: String,
    pub count: usize,
    pub details: Vec<DuplicateDetail>,
}

/// Group `copies` by exact `(slug, language)` and return the groups with more
/// than one member, largest first.
///
/// Entries with an empty or absent slug are exempt from uniqueness and are
/// never reported. Ties keep the order in which their key was first seen.
pub fn find_duplicates(copies: &[CopyEntry]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for copy in copies {
        let Some(slug) = copy.unique_slug() else {
            continue;
        };

        let detail = DuplicateDetail {
            id: copy.id,
            text: copy.text.clone(),
            created_at: copy.created_at,
        };

        match index.get(&(slug, copy.language.as_str())) {
            Some(&position) => {
                let group = &mut groups[position];
                group.count += 1;
                group.details.push(detail);
            }
            None => {
                index.insert((slug, copy.language.as_str()), groups.len());
                groups.push(DuplicateGroup {
                    slug: slug.to_string(),
                    language: copy.language.clone(),
                    count: 1,
                    details: vec![detail],
                });
            }
        }
    }

    groups.retain(|group| group.count > 1);
    // Stable sort keeps first-seen order between equal counts.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CopyStatus;
    use chrono::TimeZone;

    fn copy(id: i64, slug: Option<&str>, language: &str) -> CopyEntry {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
            + chrono::Duration::minutes(id);
        CopyEntry {
            id,
            slug: slug.map(str::to_string),
            text: format!("text {}", id),
            language: language.to_string(),
            status: CopyStatus::NotAssigned,
            tags: vec![],
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_no_duplicates() {
        let copies = vec![
            copy(1, Some("home.title"), "en"),
            copy(2, Some("home.title"), "es"),
            copy(3, Some("home.body"), "en"),
        ];
        assert!(find_duplicates(&copies).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(find_duplicates(&[]).is_empty());
    }

    #[test]
    fn test_single_group_has_all_members() {
        let copies = vec![
            copy(1, Some("home.title"), "en"),
            copy(2, Some("home.title"), "en"),
            copy(3, Some("home.title"), "es"),
        ];

        let groups = find_duplicates(&copies);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].slug, "home.title");
        assert_eq!(groups[0].language, "en");
        assert_eq!(groups[0].count, 2);
        let ids: Vec<i64> = groups[0].details.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(groups[0].details[1].text, "text 2");
    }

    #[test]
    fn test_groups_sorted_by_descending_count() {
        let copies = vec![
            copy(1, Some("a"), "en"),
            copy(2, Some("a"), "en"),
            copy(3, Some("b"), "en"),
            copy(4, Some("b"), "en"),
            copy(5, Some("b"), "en"),
            copy(6, Some("c"), "fr"),
            copy(7, Some("c"), "fr"),
            copy(8, Some("c"), "fr"),
            copy(9, Some("c"), "fr"),
        ];

        let groups = find_duplicates(&copies);

        let counts: Vec<usize> = groups.iter().map(|g| g.count).collect();
        assert_eq!(counts, vec![4, 3, 2]);
        assert_eq!(groups[0].slug, "c");
        assert_eq!(groups[2].slug, "a");
    }

    #[test]
    fn test_key_is_exact() {
        // Normalization happens before detection, so "en" and "EN" differ here.
        let copies = vec![copy(1, Some("a"), "en"), copy(2, Some("a"), "EN")];
        assert!(find_duplicates(&copies).is_empty());
    }

    #[test]
    fn test_empty_and_absent_slugs_are_ignored() {
        let copies = vec![
            copy(1, None, "en"),
            copy(2, None, "en"),
            copy(3, Some(""), "en"),
            copy(4, Some(""), "en"),
        ];
        assert!(find_duplicates(&copies).is_empty());
    }

    #[test]
    fn test_n_groups_reported() {
        let mut copies = Vec::new();
        let mut id = 0;
        for group in 0..5 {
            for _ in 0..(group + 2) {
                id += 1;
                copies.push(copy(id, Some(&format!("slug{}", group)), "de"));
            }
        }
        copies.push(copy(100, Some("unique"), "de"));

        let groups = find_duplicates(&copies);

        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| g.count >= 2 && g.count == g.details.len()));
        assert!(groups.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_detail_serializes_camel_case() {
        let groups = find_duplicates(&[copy(1, Some("a"), "en"), copy(2, Some("a"), "en")]);
        let json = serde_json::to_value(&groups[0]).expect("serialize");

        assert_eq!(json["count"], 2);
        assert!(json["details"][0].get("createdAt").is_some());
        assert_eq!(json["details"][0]["id"], 1);
    }
}
