//! Post form parsing and field-level validation.
//!
//! Parsing is purely syntactic: the body must be non-empty after trimming
//! and the group value must be empty or a numeric id. Whether that id
//! resolves to a stored group is checked by the application layer, which
//! owns repository access.

pub const BODY_REQUIRED_MESSAGE: &str = "Write something before publishing.";
pub const GROUP_INVALID_MESSAGE: &str = "Choose one of the listed groups.";

/// Raw field values as submitted by the post form.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub body: String,
    pub group: String,
}

/// A syntactically valid post submission, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub body: String,
    pub group_id: Option<i64>,
}

/// Per-field validation messages for re-rendering the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFormErrors {
    pub body: Option<String>,
    pub group: Option<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.group.is_none()
    }

    pub fn unknown_group() -> Self {
        Self {
            body: None,
            group: Some(GROUP_INVALID_MESSAGE.to_string()),
        }
    }
}

impl PostDraft {
    /// Bind raw form values, collecting every field error in one pass.
    pub fn parse(input: &PostInput) -> Result<Self, PostFormErrors> {
        let mut errors = PostFormErrors::default();

        let body = input.body.trim();
        if body.is_empty() {
            errors.body = Some(BODY_REQUIRED_MESSAGE.to_string());
        }

        let group_raw = input.group.trim();
        let group_id = if group_raw.is_empty() {
            None
        } else {
            match group_raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.group = Some(GROUP_INVALID_MESSAGE.to_string());
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(Self {
                body: body.to_string(),
                group_id,
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_binds_body_and_group() {
        let input = PostInput {
            body: "  hello world ".to_string(),
            group: "3".to_string(),
        };
        let draft = PostDraft::parse(&input).expect("valid draft");

        assert_eq!(draft.body, "hello world");
        assert_eq!(draft.group_id, Some(3));
    }

    #[test]
    fn empty_group_means_no_group() {
        let input = PostInput {
            body: "hello".to_string(),
            group: String::new(),
        };
        let draft = PostDraft::parse(&input).expect("valid draft");

        assert_eq!(draft.group_id, None);
    }

    #[test]
    fn blank_body_is_rejected() {
        let input = PostInput {
            body: "   \n ".to_string(),
            group: String::new(),
        };
        let errors = PostDraft::parse(&input).expect_err("blank body rejected");

        assert_eq!(errors.body.as_deref(), Some(BODY_REQUIRED_MESSAGE));
        assert!(errors.group.is_none());
    }

    #[test]
    fn non_numeric_group_is_rejected_alongside_blank_body() {
        let input = PostInput {
            body: String::new(),
            group: "gardening".to_string(),
        };
        let errors = PostDraft::parse(&input).expect_err("both fields rejected");

        assert!(errors.body.is_some());
        assert_eq!(errors.group.as_deref(), Some(GROUP_INVALID_MESSAGE));
    }
}
