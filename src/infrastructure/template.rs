use crate::error::AppResult;
use handlebars::Handlebars;
use serde_json::Value;

/// 下载地址模板引擎
///
/// 配置中的地址使用 `{{var}}` 占位，引用不存在的变量会报错。
pub struct UrlTemplate {
    handlebars: Handlebars<'static>,
}

impl UrlTemplate {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    /// 渲染模板
    pub fn render(&self, template: &str, data: &Value) -> AppResult<String> {
        Ok(self.handlebars.render_template(template, data)?)
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷函数
pub fn render_url(template: &str, data: &Value) -> AppResult<String> {
    UrlTemplate::new().render(template, data)
}
