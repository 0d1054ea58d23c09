//! FAQ model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    pub category: String,
    pub question: String,
    /// May embed `` color`text` `` highlight markup, see [`crate::utils::highlight`]
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Fields a new FAQ carries before the server assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDraft {
    pub category: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FaqDraft {
    /// Materialize the draft as an entry under a client-side temporary id
    pub fn into_faq(self, temp_id: String) -> Faq {
        Faq {
            id: temp_id,
            category: self.category,
            question: self.question,
            answer: self.answer,
            tags: self.tags,
        }
    }
}

/// Field-wise pending edit applied over a snapshot FAQ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl FaqPatch {
    /// Later patch fields override earlier ones, untouched fields survive
    pub fn merge(mut self, other: FaqPatch) -> FaqPatch {
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.question.is_some() {
            self.question = other.question;
        }
        if other.answer.is_some() {
            self.answer = other.answer;
        }
        if other.tags.is_some() {
            self.tags = other.tags;
        }
        self
    }

    /// Apply the patch to a snapshot FAQ, yielding the effective record
    pub fn apply(&self, base: &Faq) -> Faq {
        let mut merged = base.clone();
        if let Some(category) = &self.category {
            merged.category = category.clone();
        }
        if let Some(question) = &self.question {
            merged.question = question.clone();
        }
        if let Some(answer) = &self.answer {
            merged.answer = answer.clone();
        }
        if let Some(tags) = &self.tags {
            merged.tags = tags.clone();
        }
        merged
    }

    /// Patch carrying every field of a draft, used for create operations
    pub fn from_draft(draft: &FaqDraft) -> FaqPatch {
        FaqPatch {
            category: Some(draft.category.clone()),
            question: Some(draft.question.clone()),
            answer: Some(draft.answer.clone()),
            tags: Some(draft.tags.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_faq() -> Faq {
        Faq {
            id: "faq_1".to_string(),
            category: "Billing".to_string(),
            question: "How much does hosting cost?".to_string(),
            answer: "Hosting starts at green`$0` for the trial tier.".to_string(),
            tags: vec!["pricing".to_string()],
        }
    }

    #[test]
    fn test_patch_apply_keeps_unpatched_fields() {
        let faq = sample_faq();
        let patch = FaqPatch {
            answer: Some("Updated answer".to_string()),
            ..Default::default()
        };

        let effective = patch.apply(&faq);
        assert_eq!(effective.answer, "Updated answer");
        assert_eq!(effective.question, faq.question);
        assert_eq!(effective.category, faq.category);
        assert_eq!(effective.tags, faq.tags);
    }

    #[test]
    fn test_draft_roundtrip_through_patch() {
        let draft = FaqDraft {
            category: "General".to_string(),
            question: "What is Vinsmoke?".to_string(),
            answer: "A bot hosting platform".to_string(),
            tags: vec![],
        };

        let patch = FaqPatch::from_draft(&draft);
        assert_eq!(patch.question.as_deref(), Some("What is Vinsmoke?"));

        let faq = draft.into_faq("temp_1".to_string());
        assert_eq!(faq.id, "temp_1");
        assert_eq!(faq.category, "General");
    }
}
