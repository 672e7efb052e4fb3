use accredit_spec::Pagination;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default)]
    pub accredited: bool,
}

/// Filter for the schools directory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchoolQuery {
    pub search: Option<String>,
    pub accredited_only: bool,
    pub page: usize,
    pub per_page: usize,
}

impl SchoolQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let paging = Pagination::new(self.page, self.per_page, usize::MAX);
        let mut pairs = vec![
            ("page", paging.page.to_string()),
            ("limit", paging.per_page.to_string()),
        ];
        if let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
        {
            pairs.push(("search", search.to_string()));
        }
        if self.accredited_only {
            pairs.push(("accredited", "true".to_string()));
        }
        pairs
    }
}

/// One page of a listing. Wire form: `{"data": [...], "total": n, "page": p, "limit": l}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub number: String,
    pub school_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination: Option<String>,
    pub issued_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<String>,
    #[serde(default)]
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_pairs_normalize_paging_and_skip_blank_search() {
        let query = SchoolQuery {
            search: Some("  ".into()),
            accredited_only: true,
            page: 0,
            per_page: 0,
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("accredited", "true".to_string()),
            ]
        );
    }

    #[test]
    fn page_decodes_listing_body() {
        let page: Page<School> = serde_json::from_str(
            r#"{"data": [{"id": "s1", "name": "GS Remera", "accredited": true}], "total": 31, "page": 2, "limit": 10}"#,
        )
        .unwrap();
        assert_eq!(page.data[0].name, "GS Remera");
        assert_eq!(page.pagination().range_label(), "11-20 of 31");
    }
}
