use std::sync::Arc;

use serde::Deserialize;

use crate::{errors::PipelineError, render::Notification};

use super::{
    mailer::Mailer,
    text_gen::{FALLBACK_WELCOME_INTRO, TextGenerator, WELCOME_PROMPT},
};

/// Payload of the "user created" event raised at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpEvent {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub investment_goals: String,
    #[serde(default)]
    pub risk_tolerance: String,
    #[serde(default)]
    pub preferred_industry: String,
}

impl SignUpEvent {
    fn profile(&self) -> String {
        format!(
            "- Country: {}\n- Investment goals: {}\n- Risk tolerance: {}\n- Preferred industry: {}",
            self.country, self.investment_goals, self.risk_tolerance, self.preferred_industry
        )
    }
}

pub struct WelcomeMailer {
    text_gen: Arc<dyn TextGenerator>,
    mailer: Mailer,
}

impl WelcomeMailer {
    pub fn new(text_gen: Arc<dyn TextGenerator>, mailer: Mailer) -> Self {
        Self { text_gen, mailer }
    }

    /// Personalised intro, or the stock one when generation fails.
    pub async fn intro_for(&self, event: &SignUpEvent) -> String {
        let prompt = WELCOME_PROMPT.replace("{{userProfile}}", &event.profile());

        match self.text_gen.generate(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => FALLBACK_WELCOME_INTRO.to_string(),
            Err(e) => {
                tracing::warn!(email = %event.email, error = %e, "welcome intro generation failed");
                FALLBACK_WELCOME_INTRO.to_string()
            }
        }
    }

    pub async fn send(&self, event: &SignUpEvent) -> Result<(), PipelineError> {
        let intro = self.intro_for(event).await;

        let notification = Notification::Welcome {
            name: event.name.clone(),
            intro,
        };

        self.mailer.send(&event.email, &notification).await?;
        tracing::info!(email = %event.email, "welcome email sent");
        Ok(())
    }
}
