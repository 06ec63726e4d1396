use minijinja::value::Value;
use minijinja::Environment;
use tracing::error;

pub fn init_templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();

    env.add_template("index.html", include_str!("../../templates/index.html"))?;

    env.add_filter("cell", cell);

    Ok(env)
}

/// Renders one result value: NULL for missing values, strings unquoted.
fn cell(value: Value) -> String {
    if value.is_none() || value.is_undefined() {
        "NULL".to_string()
    } else {
        value.to_string()
    }
}

pub fn render_template(env: &Environment, template_name: &str, context: Value) -> String {
    match env.get_template(template_name) {
        Ok(tmpl) => match tmpl.render(context) {
            Ok(result) => result,
            Err(e) => {
                error!("Template render error: {}", e);
                format!("<h1>Template Error</h1><p>{}</p>", e)
            }
        },
        Err(e) => {
            error!("Template not found: {} ({})", template_name, e);
            format!("<h1>Template Not Found</h1><p>{}: {}</p>", template_name, e)
        }
    }
}
