//! Application state and core logic

use crate::api::{ApiClient, CategoryCatalog, UserDirectory};
use crate::categories::{CategoryOptionSource, LoadState};
use crate::command::{Command, HELP};
use crate::config::FormConfig;
use crate::state::{
    FieldValue, FormController, FormField, FormValue, SubmitOutcome, Witness,
    DAMAGED_PART_OPTIONS, MAX_WITNESSES,
};
use crate::validation::{CheckResolution, CheckTiming};
use anyhow::Result;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Main application struct
pub struct App {
    /// The claim form
    pub form: FormController,
    /// Options for the category select
    pub categories: CategoryOptionSource,
    /// Resolutions of debounced email checks
    checks: mpsc::UnboundedReceiver<CheckResolution>,
    /// Whether the app should quit
    quit: bool,
    /// Feedback for the last command
    pub status_message: Option<String>,
    /// Snapshot handed to the submission sink, if any
    pub last_submission: Option<FormValue>,
}

impl App {
    /// Create a new App talking to the configured endpoints
    pub async fn new(config: &FormConfig) -> Result<Self> {
        let api = Arc::new(ApiClient::new(config)?);
        Ok(Self::with_services(api.clone(), api, config.timing()).await)
    }

    /// Mount the form: seed defaults and load the category options once
    pub async fn with_services(
        catalog: Arc<dyn CategoryCatalog>,
        directory: Arc<dyn UserDirectory>,
        timing: CheckTiming,
    ) -> Self {
        let (mut form, checks) = FormController::new(directory, timing);
        let mut categories = CategoryOptionSource::new();
        categories.load(catalog.as_ref()).await;
        form.on_categories_loaded();

        Self {
            form,
            categories,
            checks,
            quit: false,
            status_message: None,
            last_submission: None,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Wait for the next debounced email check to resolve
    pub async fn next_check(&mut self) -> Option<CheckResolution> {
        self.checks.recv().await
    }

    /// Hand a check result to the form. Returns false for stale results.
    pub fn apply_check(&mut self, resolution: CheckResolution) -> bool {
        let email = resolution.email.clone();
        let applied = self.form.apply_check(resolution);
        if applied {
            tracing::debug!("Applied email check for {email}");
        }
        applied
    }

    pub async fn handle_command(&mut self, command: Command) {
        self.status_message = None;
        let result = match command {
            Command::Set { path, value } => self.form.set_field(&path, value),
            Command::Parts(parts) => self.form.set_field("damagedParts", FieldValue::Choices(parts)),
            Command::Focus(path) => self.form.focus(&path),
            Command::Blur(path) => self.form.blur(&path),
            Command::Check(path) => self.form.trigger(&path).map(|errors| {
                self.status_message = Some(if errors.is_empty() {
                    format!("{path} is valid")
                } else {
                    format!("{path} has {} error(s)", errors.len())
                });
            }),
            Command::Add => self.form.append_witness(Witness::default()).map(|index| {
                self.status_message = Some(format!("Added witness {index}"));
            }),
            Command::Remove(index) => {
                if self.form.remove_witness(index).is_some() {
                    self.status_message = Some(format!("Removed witness {index}"));
                }
                Ok(())
            }
            Command::Submit => {
                self.submit().await;
                Ok(())
            }
            Command::Reset => {
                self.form.reset();
                self.status_message = Some("Form reset".to_string());
                Ok(())
            }
            Command::Show | Command::Options | Command::Help => Ok(()),
            Command::Quit => {
                self.quit = true;
                Ok(())
            }
        };
        if let Err(e) = result {
            self.status_message = Some(e.to_string());
        }
    }

    async fn submit(&mut self) {
        match self.form.submit().await {
            SubmitOutcome::Submitted(value) => {
                let json = serde_json::to_string(&value).unwrap_or_default();
                tracing::info!(
                    submitted_at = %chrono::Utc::now().to_rfc3339(),
                    "Form Data: {json}"
                );
                self.status_message = Some("Submitted".to_string());
                self.last_submission = Some(value);
            }
            SubmitOutcome::Blocked(errors) => {
                self.status_message = Some(format!("Fix {} error(s) before submitting", errors.len()));
            }
        }
    }

    /// Text view of the form for the terminal driver
    pub fn render(&self) -> String {
        let value = self.form.value();
        let mut out = String::new();

        let _ = writeln!(out, "{}: {}", FormField::Amount.label(), number(value.amount));
        let allocation = if self.form.is_disabled("allocation") {
            "(disabled)".to_string()
        } else {
            format!(
                "{} (max {})",
                number(value.allocation),
                number(self.form.allocation_max())
            )
        };
        let _ = writeln!(out, "{}: {allocation}", FormField::Allocation.label());

        let parts: Vec<String> = DAMAGED_PART_OPTIONS
            .iter()
            .map(|p| {
                let mark = if value.damaged_parts.iter().any(|d| d == p) { "x" } else { " " };
                format!("[{mark}] {p}")
            })
            .collect();
        let _ = writeln!(out, "{}: {}", FormField::DamagedParts.label(), parts.join(" "));

        let category = match self.categories.label_of(&value.category) {
            Some(label) => format!("{} ({label})", value.category),
            None => value.category.clone(),
        };
        let _ = writeln!(out, "{}: {category}", FormField::Category.label());

        let _ = writeln!(out, "Witnesses ({}/{MAX_WITNESSES}):", value.witnesses.len());
        for (i, witness) in value.witnesses.iter().enumerate() {
            let pending = if self.form.is_email_check_pending(i) {
                " [checking]"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {i}. {}: {} | {}: {}{pending}",
                FormField::WitnessName(i).label(),
                witness.name,
                FormField::WitnessEmail(i).label(),
                witness.email
            );
        }

        if !self.form.errors().is_empty() {
            let _ = writeln!(out, "Errors:");
            for (path, message) in self.form.errors().iter() {
                let _ = writeln!(out, "  {path}: {message}");
            }
        }
        if let Some(path) = self.form.focused() {
            let _ = writeln!(out, "Focused: {path}");
        }
        if let Some(status) = &self.status_message {
            let _ = writeln!(out, "> {status}");
        }
        out
    }

    /// Category listing for the `options` command
    pub fn render_options(&self) -> String {
        match self.categories.state() {
            LoadState::Loaded => self
                .categories
                .options()
                .iter()
                .map(|o| format!("{} - {}\n", o.value, o.label))
                .collect(),
            // Failure looks the same as nothing loaded yet
            LoadState::NotLoaded | LoadState::Failed => "No categories available\n".to_string(),
        }
    }

    pub fn help() -> &'static str {
        HELP
    }
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockCategoryCatalog, MockUserDirectory};
    use crate::state::CategoryOption;

    fn catalog() -> Arc<dyn CategoryCatalog> {
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_fetch_categories().times(1).returning(|| {
            Ok(vec![CategoryOption {
                value: "kitchen-accessories".to_string(),
                label: "Kitchen Accessories".to_string(),
            }])
        });
        Arc::new(catalog)
    }

    fn directory() -> Arc<dyn UserDirectory> {
        let mut directory = MockUserDirectory::new();
        directory.expect_count_matches().returning(|_| Ok(0));
        Arc::new(directory)
    }

    async fn app() -> App {
        App::with_services(catalog(), directory(), CheckTiming::default()).await
    }

    impl App {
        async fn handle_line(&mut self, line: &str) {
            match Command::parse(line) {
                Ok(Some(command)) => self.handle_command(command).await,
                Ok(None) => {}
                Err(e) => self.status_message = Some(e.to_string()),
            }
        }
    }

    #[tokio::test]
    async fn test_mount_loads_categories() {
        let app = app().await;
        assert!(app.categories.is_loaded());
        assert!(app.render().contains("Category: kitchen-accessories (Kitchen Accessories)"));
        assert_eq!(app.render_options(), "kitchen-accessories - Kitchen Accessories\n");
    }

    #[tokio::test]
    async fn test_failed_catalog_renders_no_options() {
        let mut failing = MockCategoryCatalog::new();
        failing.expect_fetch_categories().returning(|| {
            Err(ApiError::Status {
                url: "https://example.test/products/categories".to_string(),
                status: 502,
            })
        });
        let app = App::with_services(Arc::new(failing), directory(), CheckTiming::default()).await;
        assert_eq!(app.render_options(), "No categories available\n");
    }

    #[tokio::test]
    async fn test_submit_defaults_reaches_sink() {
        let mut app = app().await;
        app.handle_line("submit").await;
        assert_eq!(app.status_message.as_deref(), Some("Submitted"));
        assert_eq!(app.last_submission, Some(FormValue::initial()));
    }

    #[tokio::test]
    async fn test_blocked_submit_skips_sink() {
        let mut app = app().await;
        app.handle_line("set category").await;
        app.handle_line("submit").await;
        assert!(app.last_submission.is_none());
        assert_eq!(app.form.error("category"), Some("Category is required"));
        assert!(app.render().contains("category: Category is required"));
    }

    #[tokio::test]
    async fn test_allocation_scenario_through_commands() {
        let mut app = app().await;
        app.handle_line("set amount").await;
        assert!(app.render().contains("Allocation: (disabled)"));

        app.handle_line("set allocation 5").await;
        assert_eq!(app.status_message.as_deref(), Some("`allocation` is disabled"));

        app.handle_line("set amount 100").await;
        app.handle_line("set allocation 150").await;
        app.handle_line("blur allocation").await;
        assert_eq!(app.form.error("allocation"), Some("Maximum value is 100"));
        assert!(app.render().contains("Allocation: 150 (max 100)"));
    }

    #[tokio::test]
    async fn test_witness_commands() {
        let mut app = app().await;
        for _ in 0..3 {
            app.handle_line("add").await;
        }
        app.handle_line("add").await;
        assert_eq!(
            app.status_message.as_deref(),
            Some("no more than 5 witnesses allowed")
        );

        app.handle_line("remove 4").await;
        assert_eq!(app.status_message.as_deref(), Some("Removed witness 4"));
        app.handle_line("remove 9").await;
        assert!(app.status_message.is_none());
        assert_eq!(app.form.value().witnesses.len(), 4);
    }

    #[tokio::test]
    async fn test_parse_errors_are_reported() {
        let mut app = app().await;
        app.handle_line("remove x").await;
        assert!(app.status_message.unwrap().contains("witness index"));
    }

    #[tokio::test]
    async fn test_focus_is_rendered_until_blur() {
        let mut app = app().await;
        app.handle_line("focus witnesses.1.name").await;
        assert!(app.render().contains("Focused: witnesses.1.name"));
        app.handle_line("blur witnesses.1.name").await;
        assert!(!app.render().contains("Focused:"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = app().await;
        assert!(!app.should_quit());
        app.handle_line("quit").await;
        assert!(app.should_quit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_check_reaches_form() {
        let mut directory = MockUserDirectory::new();
        directory.expect_count_matches().returning(|_| Ok(2));
        let mut app =
            App::with_services(catalog(), Arc::new(directory), CheckTiming::default()).await;

        app.handle_line("set witnesses.0.email taken@example.cz").await;
        assert!(app.render().contains("[checking]"));

        let resolution = app.next_check().await.unwrap();
        assert!(app.apply_check(resolution));
        assert_eq!(app.form.error("witnesses.0.email"), Some("Email already exists"));
    }
}
