use anyhow::Result;
use chrono::{DateTime, Local};
use log::{debug, info};

use super::DataService;
use crate::api::PostsApi;
use crate::frontmatter;
use crate::models::post::today;
use crate::models::{Post, PostInput, SaveOutcome};

const TEMPLATE_BODY: &str = r#"# Start writing here...

**Markdown** is supported in the preview.

```rust
fn main() {
    println!("Hello World");
}
```
"#;

/// A fresh document, dated today.
pub fn default_template() -> String {
    format!(
        "---\ntitle: \"New post title\"\ndate: {}\ntags: [\"tech\", \"new\"]\ncover: \"/assets/cover1.jpg\"\n---\n\n{TEMPLATE_BODY}",
        today()
    )
}

/// What the author sees rendered: the body without its front matter.
pub fn preview(document: &str) -> String {
    frontmatter::remove_front_matter(document)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    /// Came from the draft buffer rather than the template.
    pub restored: bool,
}

impl Draft {
    /// A draft that pins a slug updates that post instead of creating one.
    pub fn is_edit_mode(&self) -> bool {
        frontmatter::parse(&self.content).front_matter.slug.is_some()
    }
}

pub struct Editor<'a, P> {
    service: &'a DataService<P>,
}

impl<'a, P: PostsApi> Editor<'a, P> {
    pub fn new(service: &'a DataService<P>) -> Self {
        Self { service }
    }

    pub fn open_draft(&self) -> Draft {
        match self.service.store().draft() {
            Some(content) => {
                debug!("restoring draft from the draft buffer");
                Draft {
                    content,
                    restored: true,
                }
            }
            None => Draft {
                content: default_template(),
                restored: false,
            },
        }
    }

    /// Puts an existing post into the draft buffer for editing.
    pub fn start_editing(&self, post: &Post) -> Result<Draft> {
        let content = post.to_document();
        self.service.store().save_draft(&content)?;
        Ok(Draft {
            content,
            restored: true,
        })
    }

    pub fn autosave(&self, content: &str) -> Result<DateTime<Local>> {
        self.service.store().save_draft(content)?;
        Ok(Local::now())
    }

    pub fn discard(&self) -> Result<()> {
        self.service.store().clear_draft()
    }

    /// Saves through the data service and clears the draft buffer. A local
    /// only save still counts as done; the caller should tell the author.
    pub async fn publish(&self, content: &str) -> Result<SaveOutcome> {
        let outcome = self.service.save_post(PostInput::new(content)).await?;
        self.service.store().clear_draft()?;
        info!("published {}", outcome.post().slug);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_and_is_not_edit_mode() {
        let template = default_template();
        let parsed = frontmatter::parse(&template);
        assert_eq!(parsed.front_matter.title.as_deref(), Some("New post title"));
        assert_eq!(parsed.front_matter.date, Some(today()));
        assert!(parsed.body.starts_with("# Start writing here"));

        let draft = Draft {
            content: template,
            restored: false,
        };
        assert!(!draft.is_edit_mode());
    }

    #[test]
    fn preview_strips_front_matter() {
        assert_eq!(preview("---\ntitle: x\n---\n\n# Hi\n"), "# Hi");
        assert_eq!(preview("# No block"), "# No block");
    }

    #[test]
    fn slug_in_front_matter_means_edit_mode() {
        let draft = Draft {
            content: "---\ntitle: x\nslug: \"x\"\n---\nbody".to_string(),
            restored: true,
        };
        assert!(draft.is_edit_mode());
    }
}
