use std::fmt;

/// Identity of a model inside the registry: `(app_label, model_name)`.
///
/// The model name is always stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey {
    pub app_label: String,
    pub model_name: String,
}

impl ModelKey {
    pub fn new(app_label: impl Into<String>, model_name: impl AsRef<str>) -> Self {
        Self { app_label: app_label.into(), model_name: model_name.as_ref().to_lowercase() }
    }

    /// Parses `"app_label.ModelName"`. Anything but exactly one dot yields `None`.
    #[must_use]
    pub fn parse(reference: &str) -> Option<Self> {
        let (app_label, model_name) = reference.split_once('.')?;
        if app_label.is_empty() || model_name.is_empty() || model_name.contains('.') {
            return None;
        }
        Some(Self::new(app_label, model_name))
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

impl<L: Into<String>, N: AsRef<str>> From<(L, N)> for ModelKey {
    fn from((app_label, model_name): (L, N)) -> Self {
        Self::new(app_label, model_name)
    }
}

/// Class-level metadata of a model definition.
///
/// `module` and `object_name` together form the class identity used to tell a
/// harmless double import apart from two different models claiming one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    pub app_label: String,
    /// Class name as written, e.g. `Post`.
    pub object_name: String,
    /// Dotted path of the defining module, e.g. `blog.models`.
    pub module: String,
    /// Set for implicit many-to-many through tables.
    pub auto_created: bool,
    /// Setting name through which this model can be replaced.
    pub swappable: Option<String>,
    /// Label of the model that replaced this one.
    pub swapped: Option<String>,
}

impl ModelOptions {
    pub fn new(
        app_label: impl Into<String>,
        object_name: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            object_name: object_name.into(),
            module: module.into(),
            auto_created: false,
            swappable: None,
            swapped: None,
        }
    }

    #[must_use]
    pub const fn auto_created(mut self, auto_created: bool) -> Self {
        self.auto_created = auto_created;
        self
    }

    #[must_use]
    pub fn swappable(mut self, setting: impl Into<String>) -> Self {
        self.swappable = Some(setting.into());
        self
    }

    #[must_use]
    pub fn swapped_by(mut self, replacement: Option<String>) -> Self {
        self.swapped = replacement;
        self
    }

    #[must_use]
    pub fn model_name(&self) -> String {
        self.object_name.to_lowercase()
    }

    /// `app_label.ObjectName`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.object_name)
    }

    /// `app_label.modelname`
    #[must_use]
    pub fn label_lower(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name())
    }

    #[must_use]
    pub fn key(&self) -> ModelKey {
        ModelKey::new(self.app_label.clone(), &self.object_name)
    }

    #[must_use]
    pub const fn is_swapped(&self) -> bool {
        self.swapped.is_some()
    }

    /// Whether `other` describes the same class (same module, same name).
    #[must_use]
    pub fn same_class(&self, other: &Self) -> bool {
        self.module == other.module && self.object_name == other.object_name
    }
}
