//! Permission strings.
//!
//! A permission string has the shape `app_label.action_modelname`, e.g.
//! `blog.change_article`. The action is everything before the last `_` of
//! the codename, the model name everything after it.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::ModelType;

/// Actions every model type supports out of the box.
pub const DEFAULT_ACTIONS: [&str; 4] = ["add", "change", "delete", "view"];

pub const ADD: &str = "add";
pub const CHANGE: &str = "change";
pub const DELETE: &str = "delete";

lazy_static! {
    static ref PERMISSION_PATTERN: Regex =
        Regex::new(r"^[a-z][a-z0-9_]*\.[a-z0-9]+(_[a-z0-9]+)*_[a-z0-9]+$")
            .expect("permission pattern is a valid regex");
}

/// A parsed permission string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    app_label: String,
    codename: String,
}

impl Permission {
    /// Parse a permission string.
    pub fn parse(permission: &str) -> Result<Self, Error> {
        if !PERMISSION_PATTERN.is_match(permission) {
            return Err(Error::InvalidPermission(permission.to_string()));
        }

        let (app_label, codename) = permission
            .split_once('.')
            .ok_or_else(|| Error::InvalidPermission(permission.to_string()))?;

        Ok(Self {
            app_label: app_label.to_string(),
            codename: codename.to_string(),
        })
    }

    /// Build the permission for an action on a model type.
    pub fn for_model(model: &ModelType, action: &str) -> Self {
        Self {
            app_label: model.app_label().to_string(),
            codename: format!("{}_{}", action, model.model_name()),
        }
    }

    /// Build a permission from an application label and a codename.
    pub fn from_codename(app_label: &str, codename: &str) -> Result<Self, Error> {
        Self::parse(&format!("{}.{}", app_label, codename))
    }

    /// The default permissions of a model type.
    pub fn defaults_for(model: &ModelType) -> Vec<Self> {
        DEFAULT_ACTIONS
            .iter()
            .map(|action| Self::for_model(model, action))
            .collect()
    }

    /// The application label.
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// The codename, e.g. `change_article`.
    pub fn codename(&self) -> &str {
        &self.codename
    }

    /// The action verb, e.g. `change`.
    pub fn action(&self) -> &str {
        self.split().0
    }

    /// The target model name, e.g. `article`.
    pub fn model_name(&self) -> &str {
        self.split().1
    }

    /// The model type this permission is about.
    pub fn target(&self) -> ModelType {
        ModelType::new(self.app_label.as_str(), self.model_name())
    }

    /// Whether this permission is about the given model type.
    pub fn targets(&self, model: &ModelType) -> bool {
        self.app_label == model.app_label() && self.model_name() == model.model_name()
    }

    fn split(&self) -> (&str, &str) {
        // The pattern guarantees at least one underscore.
        self.codename
            .rsplit_once('_')
            .unwrap_or((self.codename.as_str(), ""))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.codename)
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_serializes_as_string() {
        let permission = Permission::parse("blog.publish_article").unwrap();
        let encoded = serde_json::to_value(&permission).unwrap();
        assert_eq!(encoded, serde_json::json!("blog.publish_article"));

        let decoded: Permission = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.action(), "publish");
        assert!(serde_json::from_str::<Permission>("\"article\"").is_err());
    }

    #[test]
    fn test_parse_permission() {
        let permission = Permission::parse("blog.change_article").unwrap();
        assert_eq!(permission.app_label(), "blog");
        assert_eq!(permission.codename(), "change_article");
        assert_eq!(permission.action(), "change");
        assert_eq!(permission.model_name(), "article");
        assert_eq!(permission.to_string(), "blog.change_article");
    }

    #[test]
    fn test_parse_custom_action() {
        let permission: Permission = "blog.publish_draft_article".parse().unwrap();
        assert_eq!(permission.action(), "publish_draft");
        assert_eq!(permission.model_name(), "article");
        assert_eq!(permission.target(), ModelType::new("blog", "article"));
    }

    #[test]
    fn test_parse_underscored_app_label() {
        let permission = Permission::parse("my_blog.view_article").unwrap();
        assert_eq!(permission.app_label(), "my_blog");
        assert!(permission.targets(&ModelType::new("my_blog", "article")));
        assert!(!permission.targets(&ModelType::new("blog", "article")));
    }

    #[test]
    fn test_reject_malformed_permissions() {
        for malformed in ["", "blog", "blog.", ".change_article", "blog.article", "Blog.Change_Article", "blog.change article"] {
            let result = Permission::parse(malformed);
            assert!(matches!(result, Err(Error::InvalidPermission(_))), "{malformed:?} parsed");
        }
    }

    #[test]
    fn test_defaults_for_model() {
        let model = ModelType::new("blog", "Article");
        let defaults: Vec<String> = Permission::defaults_for(&model)
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            defaults,
            vec!["blog.add_article", "blog.change_article", "blog.delete_article", "blog.view_article"]
        );
    }
}
