//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで送信メッセージの本文を HTML に展開する。
//!
//! テンプレートは起動時に `{template_folder}/**/*.html` から読み込む。
//! テンプレート名はフォルダからの相対パス（例: `password_reset.html`）になる。

use std::path::Path;

use courier_domain::notification::{NotificationError, TemplateBody, TemplateName};
use tera::{Context, Tera};

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// テンプレートフォルダ配下の HTML テンプレートを読み込む
    pub fn from_folder(folder: impl AsRef<Path>) -> Result<Self, NotificationError> {
        let pattern = format!("{}/**/*.html", folder.as_ref().display());
        let engine =
            Tera::new(&pattern).map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        tracing::debug!(
            %pattern,
            count = engine.get_template_names().count(),
            "メールテンプレートを読み込みました"
        );

        Ok(Self { engine })
    }

    /// 名前とソースの組からテンプレートを登録する
    pub fn from_raw<'a>(
        templates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();
        engine
            .add_raw_templates(templates)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        Ok(Self { engine })
    }

    /// テンプレートが登録済みか
    pub fn contains(&self, template_name: &TemplateName) -> bool {
        self.engine
            .get_template_names()
            .any(|name| name == template_name.as_str())
    }

    /// テンプレート変数を展開して HTML を生成する
    pub fn render(
        &self,
        template_name: &TemplateName,
        body: &TemplateBody,
    ) -> Result<String, NotificationError> {
        let context = Context::from_serialize(body)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        self.engine
            .render(template_name.as_str(), &context)
            .map_err(|e| NotificationError::TemplateFailed(format!("{template_name}: {e}")))
    }
}
