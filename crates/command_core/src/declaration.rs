use std::{fmt, sync::Arc};

/// A label is either fixed text or a producer evaluated each time the label is shown, so that
/// translated strings follow the active locale.
#[derive(Clone)]
pub enum Label {
    Literal(String),
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Label {
    pub fn lazy(producer: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Lazy(Arc::new(producer))
    }

    pub fn resolve(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Lazy(producer) => producer(),
        }
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandDeclaration {
    pub name: String,
    /// Menu item label and toolbar tooltip. Empty for internal commands.
    pub label: Label,
    /// Context shown before the label where the menu hierarchy is not visible, for example
    /// "Focus" for a "Note list" item.
    pub parent_label: Option<Label>,
    pub description: Option<String>,
    pub icon_name: String,
    pub tinymce_icon_name: Option<String>,
    pub role: Option<String>,
}

impl CommandDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_parent_label(mut self, label: impl Into<Label>) -> Self {
        self.parent_label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_icon(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = icon_name.into();
        self
    }

    pub fn with_tinymce_icon(mut self, icon_name: impl Into<String>) -> Self {
        self.tinymce_icon_name = Some(icon_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}
