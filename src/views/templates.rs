use handlebars::Handlebars;
use std::sync::Arc;

use crate::errors::RenderError;

pub type Hbs = Arc<Handlebars<'static>>;

const EMAIL_TEMPLATES: &[(&str, &str)] = &[
    ("welcome/subject", include_str!("../../templates/emails/welcome_subject.hbs")),
    ("welcome/html", include_str!("../../templates/emails/welcome.html.hbs")),
    ("welcome/text", include_str!("../../templates/emails/welcome_text.hbs")),
    ("news_digest/subject", include_str!("../../templates/emails/news_digest_subject.hbs")),
    ("news_digest/html", include_str!("../../templates/emails/news_digest.html.hbs")),
    ("news_digest/text", include_str!("../../templates/emails/news_digest_text.hbs")),
    ("min_threshold/subject", include_str!("../../templates/emails/min_threshold_subject.hbs")),
    ("min_threshold/html", include_str!("../../templates/emails/min_threshold.html.hbs")),
    ("min_threshold/text", include_str!("../../templates/emails/min_threshold_text.hbs")),
    ("max_threshold/subject", include_str!("../../templates/emails/max_threshold_subject.hbs")),
    ("max_threshold/html", include_str!("../../templates/emails/max_threshold.html.hbs")),
    ("max_threshold/text", include_str!("../../templates/emails/max_threshold_text.hbs")),
];

/// Builds the email template registry.
///
/// The renderer escapes html values itself before they reach handlebars, so
/// the registry substitutes everything verbatim. Strict mode turns a missing
/// field into an error instead of an empty string.
pub fn build_handlebars() -> Result<Hbs, RenderError> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);

    for (name, source) in EMAIL_TEMPLATES {
        hb.register_template_string(name, *source)?;
    }

    Ok(Arc::new(hb))
}
