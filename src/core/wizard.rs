use crate::core::backend::BackendClient;
use crate::core::itinerary::Itinerary;
use crate::core::{ServiceDraft, ServicePayload};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{validate_range, validate_required_field};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo,
    Images,
    Pricing,
    Location,
    Providers,
    Packages,
    Itinerary,
    IncludesExcludes,
    Faqs,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 10] = [
        WizardStep::BasicInfo,
        WizardStep::Images,
        WizardStep::Pricing,
        WizardStep::Location,
        WizardStep::Providers,
        WizardStep::Packages,
        WizardStep::Itinerary,
        WizardStep::IncludesExcludes,
        WizardStep::Faqs,
        WizardStep::Review,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "basic_info",
            WizardStep::Images => "images",
            WizardStep::Pricing => "pricing",
            WizardStep::Location => "location",
            WizardStep::Providers => "providers",
            WizardStep::Packages => "packages",
            WizardStep::Itinerary => "itinerary",
            WizardStep::IncludesExcludes => "includes_excludes",
            WizardStep::Faqs => "faqs",
            WizardStep::Review => "review",
        }
    }
}

fn incomplete(step: WizardStep, message: impl Into<String>) -> MarketError {
    MarketError::StepValidationError {
        step: step.title().to_string(),
        message: message.into(),
    }
}

/// Checks the fields a single step is responsible for.
pub fn validate_step(step: WizardStep, draft: &ServiceDraft) -> Result<()> {
    match step {
        WizardStep::BasicInfo => {
            if draft.name.trim().is_empty() {
                return Err(incomplete(step, "name is required"));
            }
            if draft.description.trim().is_empty() {
                return Err(incomplete(step, "description is required"));
            }
            if draft.category.trim().is_empty() {
                return Err(incomplete(step, "category is required"));
            }
        }
        WizardStep::Images => {
            if draft.images.is_empty() {
                return Err(incomplete(step, "at least one image is required"));
            }
            if draft.images.iter().any(|image| image.trim().is_empty()) {
                return Err(incomplete(step, "image URLs cannot be blank"));
            }
        }
        WizardStep::Pricing => {
            let price = validate_required_field("price", &draft.price)
                .map_err(|_| incomplete(step, "price is required"))?;
            if !price.is_finite() || *price <= 0.0 {
                return Err(incomplete(step, "price must be greater than zero"));
            }
            if let Some(discount) = draft.discount_percent {
                validate_range("discount_percent", discount, 0.0, 100.0)
                    .map_err(|_| incomplete(step, "discount must be between 0 and 100"))?;
            }
        }
        WizardStep::Location => {
            let location = &draft.location;
            if location.city.trim().is_empty() || location.country.trim().is_empty() {
                return Err(incomplete(step, "city and country are required"));
            }
            if let Some(latitude) = location.latitude {
                validate_range("latitude", latitude, -90.0, 90.0)
                    .map_err(|_| incomplete(step, "latitude out of range"))?;
            }
            if let Some(longitude) = location.longitude {
                validate_range("longitude", longitude, -180.0, 180.0)
                    .map_err(|_| incomplete(step, "longitude out of range"))?;
            }
        }
        WizardStep::Providers => {
            if draft.providers.is_empty() {
                return Err(incomplete(step, "at least one provider is required"));
            }
        }
        WizardStep::Packages => {
            for package in &draft.packages {
                if package.name.trim().is_empty() {
                    return Err(incomplete(step, "package name is required"));
                }
                if !package.price.is_finite() || package.price < 0.0 {
                    return Err(incomplete(
                        step,
                        format!("package '{}' has an invalid price", package.name),
                    ));
                }
            }
        }
        WizardStep::Itinerary => {
            if draft.itinerary.is_empty() {
                return Err(incomplete(step, "add at least one activity"));
            }
            Itinerary::from_activities(draft.itinerary.clone())
                .map_err(|e| incomplete(step, e.to_string()))?;
        }
        WizardStep::IncludesExcludes => {
            if draft
                .includes
                .iter()
                .chain(draft.excludes.iter())
                .any(|item| item.trim().is_empty())
            {
                return Err(incomplete(step, "blank include/exclude entries"));
            }
        }
        WizardStep::Faqs => {
            for faq in &draft.faqs {
                if faq.question.trim().is_empty() || faq.answer.trim().is_empty() {
                    return Err(incomplete(step, "every FAQ needs a question and an answer"));
                }
            }
        }
        WizardStep::Review => {}
    }

    Ok(())
}

/// Multi-step service-creation flow over a single shared draft.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    current_step: usize,
    draft: ServiceDraft,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: ServiceDraft) -> Self {
        Self {
            current_step: 0,
            draft,
        }
    }

    pub fn steps(&self) -> &'static [WizardStep] {
        &WizardStep::ALL
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> WizardStep {
        WizardStep::ALL[self.current_step]
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == WizardStep::ALL.len()
    }

    pub fn draft(&self) -> &ServiceDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ServiceDraft {
        &mut self.draft
    }

    /// Advances when the current step validates. Stays put on the last step.
    pub fn next_step(&mut self) -> Result<usize> {
        validate_step(self.step(), &self.draft)?;
        if !self.is_last_step() {
            self.current_step += 1;
        }
        tracing::debug!("Wizard at step {} ({})", self.current_step, self.step().title());
        Ok(self.current_step)
    }

    pub fn previous_step(&mut self) -> usize {
        self.current_step = self.current_step.saturating_sub(1);
        self.current_step
    }

    /// Jumps to `index`; out-of-range indexes leave the wizard where it is.
    pub fn go_to_step(&mut self, index: isize) -> usize {
        if index >= 0 && (index as usize) < WizardStep::ALL.len() {
            self.current_step = index as usize;
        } else {
            tracing::debug!("Ignoring jump to out-of-range step {}", index);
        }
        self.current_step
    }

    /// Assembles the creation payload once every step validates.
    pub fn payload(&self) -> Result<ServicePayload> {
        for step in WizardStep::ALL {
            validate_step(step, &self.draft)?;
        }

        let draft = self.draft.clone();
        let itinerary = Itinerary::from_activities(draft.itinerary)?.into_activities();

        Ok(ServicePayload {
            name: draft.name.trim().to_string(),
            description: draft.description,
            category: draft.category,
            images: draft.images,
            price: draft.price.unwrap_or_default(),
            currency: draft.currency,
            discount_percent: draft.discount_percent.unwrap_or(0.0),
            location: draft.location,
            providers: draft.providers,
            packages: draft.packages,
            itinerary,
            includes: draft.includes,
            excludes: draft.excludes,
            faqs: draft.faqs,
        })
    }

    /// Posts the assembled service to the backend. Only allowed from the
    /// review step; the draft is discarded once the backend accepts it.
    pub async fn submit(self, backend: &BackendClient) -> Result<serde_json::Value> {
        if !self.is_last_step() {
            return Err(incomplete(self.step(), "submit is only available from review"));
        }

        let payload = self.payload()?;
        tracing::info!("Submitting service '{}'", payload.name);
        backend.create_service(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Activity, Faq, Location, Package};

    pub(crate) fn complete_draft() -> ServiceDraft {
        ServiceDraft {
            name: "Sunrise Hike".to_string(),
            description: "Guided hike to the summit".to_string(),
            category: "adventure".to_string(),
            images: vec!["https://img.example.com/1.jpg".to_string()],
            price: Some(120.0),
            discount_percent: Some(10.0),
            location: Location {
                address: "Trailhead 1".to_string(),
                city: "Cusco".to_string(),
                country: "Peru".to_string(),
                latitude: Some(-13.5),
                longitude: Some(-71.9),
            },
            providers: vec!["supplier-1".to_string()],
            packages: vec![Package {
                name: "Standard".to_string(),
                price: 120.0,
                description: String::new(),
            }],
            itinerary: vec![
                Activity {
                    id: "b".to_string(),
                    title: "Summit".to_string(),
                    date: "2025-06-01".to_string(),
                    time: "06:00".to_string(),
                    ..Default::default()
                },
                Activity {
                    id: "a".to_string(),
                    title: "Meet".to_string(),
                    date: "2025-06-01".to_string(),
                    time: "04:30".to_string(),
                    ..Default::default()
                },
            ],
            includes: vec!["Breakfast".to_string()],
            excludes: vec!["Tips".to_string()],
            faqs: vec![Faq {
                question: "Is it hard?".to_string(),
                answer: "Moderate".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_next_step_blocked_by_validation() {
        let mut wizard = Wizard::new();
        let err = wizard.next_step().unwrap_err();
        assert!(matches!(err, MarketError::StepValidationError { .. }));
        assert_eq!(wizard.current_step(), 0);

        wizard.draft_mut().name = "Tour".to_string();
        wizard.draft_mut().description = "A tour".to_string();
        wizard.draft_mut().category = "city".to_string();
        assert_eq!(wizard.next_step().unwrap(), 1);
    }

    #[test]
    fn test_go_to_step_clamps_and_is_idempotent() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.go_to_step(3), 3);
        assert_eq!(wizard.go_to_step(3), 3);
        assert_eq!(wizard.go_to_step(-1), 3);
        assert_eq!(wizard.go_to_step(999), 3);
        assert_eq!(wizard.go_to_step(9), 9);
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_previous_step_saturates() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.previous_step(), 0);
        wizard.go_to_step(2);
        assert_eq!(wizard.previous_step(), 1);
    }

    #[test]
    fn test_walk_all_steps_with_complete_draft() {
        let mut wizard = Wizard::with_draft(complete_draft());
        for _ in 0..WizardStep::ALL.len() {
            wizard.next_step().unwrap();
        }
        assert!(wizard.is_last_step());
        assert_eq!(wizard.current_step(), WizardStep::ALL.len() - 1);
    }

    #[test]
    fn test_payload_sorts_itinerary() {
        let wizard = Wizard::with_draft(complete_draft());
        let payload = wizard.payload().unwrap();
        assert_eq!(payload.itinerary[0].id, "a");
        assert_eq!(payload.discount_percent, 10.0);
    }

    #[test]
    fn test_payload_assigns_blank_activity_ids() {
        let mut draft = complete_draft();
        for activity in &mut draft.itinerary {
            activity.id.clear();
        }

        let payload = Wizard::with_draft(draft).payload().unwrap();
        let mut ids: Vec<_> = payload.itinerary.iter().map(|a| a.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["act-1", "act-2"]);
    }

    #[test]
    fn test_payload_reports_first_invalid_step() {
        let mut draft = complete_draft();
        draft.price = None;
        draft.providers.clear();

        let err = Wizard::with_draft(draft).payload().unwrap_err();
        match err {
            MarketError::StepValidationError { step, .. } => assert_eq!(step, "pricing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pricing_rejects_bad_discount() {
        let mut draft = complete_draft();
        draft.discount_percent = Some(150.0);
        assert!(validate_step(WizardStep::Pricing, &draft).is_err());
    }

    #[test]
    fn test_itinerary_step_checks_activity_format() {
        let mut draft = complete_draft();
        draft.itinerary[0].time = "6am".to_string();
        assert!(validate_step(WizardStep::Itinerary, &draft).is_err());
    }
}
