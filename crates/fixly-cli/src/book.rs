//! The booking wizard driven end to end from command-line flags.
//!
//! Steps run in wizard order and each consumes its flags; a step whose
//! flags are missing stops the walk with a pointer at what to add. The
//! expert step with no `--expert` prints the candidate list and exits so
//! the user can pick an id and re-run.

use chrono::{Local, NaiveDate, NaiveTime};
use clap::Args;

use fixly_booking::{BookingWizard, WizardStep};
use fixly_core::{
    BookingDraft, ExpertProfile, GeoPoint, ServiceCategory, TimeWindow, Urgency,
};
use fixly_session::SessionManager;

use crate::auth::require_session;
use crate::notify::pending;

/// Flags covering every wizard step.
#[derive(Debug, Args)]
pub(crate) struct BookArgs {
    /// Service category (plumber, electrician, carpenter, ...)
    #[arg(long)]
    pub(crate) category: Option<ServiceCategory>,
    /// What needs doing
    #[arg(long)]
    pub(crate) description: Option<String>,
    /// low, medium, high or emergency
    #[arg(long, default_value = "medium")]
    pub(crate) urgency: Urgency,
    /// Street address for the visit
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// Latitude, paired with --lng
    #[arg(long)]
    pub(crate) lat: Option<f64>,
    /// Longitude, paired with --lat
    #[arg(long)]
    pub(crate) lng: Option<f64>,
    /// Preferred date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) date: Option<NaiveDate>,
    /// Arrival window start (HH:MM)
    #[arg(long, value_parser = parse_hhmm)]
    pub(crate) from: Option<NaiveTime>,
    /// Arrival window end (HH:MM)
    #[arg(long, value_parser = parse_hhmm)]
    pub(crate) to: Option<NaiveTime>,
    /// Any time on the chosen date works
    #[arg(long)]
    pub(crate) flexible: bool,
    /// Book this expert directly; their primary service fills in the
    /// category when --category is omitted
    #[arg(long)]
    pub(crate) expert: Option<String>,
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Walk the wizard from the flags, submit at review, then open the
/// payment intent for the created booking.
///
/// # Errors
///
/// Returns an error when a step's flags are missing or invalid, when
/// the backend rejects the submission, or when the payment intent cannot
/// be opened.
pub(crate) async fn run_book(session: &mut SessionManager, args: BookArgs) -> anyhow::Result<()> {
    require_session(session).await?;
    let today = Local::now().date_naive();
    let api = session.api().clone();

    let mut wizard = if let (Some(expert_id), None) = (&args.expert, args.category) {
        pending("Fetching expert");
        let profile = api.get_expert(expert_id).await?;
        let mut wizard = BookingWizard::for_expert(&profile)?;
        // The expert shortcut skips the service step, so its flags are
        // consumed here instead of in the walk below.
        let Some(description) = args.description.as_deref() else {
            anyhow::bail!("step 1 needs --description");
        };
        let Some(category) = wizard.draft().category() else {
            anyhow::bail!("that expert lists no trade; add --category");
        };
        wizard.set_service(category, None, description, args.urgency)?;
        wizard
    } else {
        BookingWizard::new()
    };

    loop {
        let step = wizard.step();
        println!("[{}/5] {}: {}", step.number(), step.title(), step.prompt());
        match step {
            WizardStep::Service => {
                let (category, description) = match (args.category, args.description.as_deref()) {
                    (Some(category), Some(description)) => (category, description),
                    _ => anyhow::bail!("step 1 needs --category and --description"),
                };
                wizard.set_service(category, None, description, args.urgency)?;
            }
            WizardStep::Location => {
                let Some(address) = args.address.as_deref() else {
                    anyhow::bail!("step 2 needs --address");
                };
                let coordinates = match (args.lat, args.lng) {
                    (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
                    (None, None) => None,
                    _ => anyhow::bail!("--lat and --lng go together"),
                };
                wizard.set_location(address, coordinates, None, None)?;
            }
            WizardStep::Schedule => {
                let Some(date) = args.date else {
                    anyhow::bail!("step 3 needs --date (YYYY-MM-DD)");
                };
                let window = match (args.from, args.to) {
                    (Some(from), Some(to)) => Some(TimeWindow::new(from, to)?),
                    (None, None) => None,
                    _ => anyhow::bail!("--from and --to go together"),
                };
                wizard.set_schedule(date, window, args.flexible, today)?;
            }
            WizardStep::Expert => {
                if wizard.draft().expert().is_none() {
                    let Some(expert_id) = &args.expert else {
                        pending("Looking up experts");
                        let candidates = wizard.load_experts(&api).await?;
                        print_candidates(&candidates);
                        return Ok(());
                    };
                    pending("Fetching expert");
                    let profile = api.get_expert(expert_id).await?;
                    wizard.choose_expert(&profile)?;
                }
            }
            WizardStep::Review => break,
        }
        wizard.next(today)?;
    }

    print_review(wizard.draft());
    pending("Creating booking");
    let booking = wizard
        .submit(&api, today)
        .await
        .map_err(|failure| failure.error)?;
    println!("Booking {} created: {}.", booking.id, booking.status.label());

    pending("Requesting payment intent");
    let amount = booking.pricing.final_price();
    let intent = api.create_payment_intent(&booking.id, amount).await?;
    println!(
        "Pay \u{20b9}{amount:.2} with client secret {}.",
        intent.client_secret
    );
    Ok(())
}

fn print_candidates(experts: &[ExpertProfile]) {
    if experts.is_empty() {
        println!("no experts available for that category right now");
        return;
    }

    println!(
        "{:<26}{:<22}{:<8}{:<10}ONLINE",
        "ID", "NAME", "RATING", "RATE"
    );
    for expert in experts {
        let rating = expert.rating.unwrap_or_default();
        let rate = expert
            .primary_service()
            .and_then(|s| s.hourly_rate)
            .map_or_else(|| "\u{2014}".to_string(), |r| format!("{r:.0}/hr"));
        println!(
            "{:<26}{:<22}{:<8.1}{:<10}{}",
            expert.id,
            expert.user.name,
            rating.stars(),
            rate,
            if expert.is_online { "yes" } else { "no" },
        );
    }
    println!();
    println!("re-run with --expert <id> to finish the booking");
}

fn print_review(draft: &BookingDraft) {
    println!();
    if let Some(category) = draft.category() {
        println!("Service:  {} ({})", category.label(), draft.urgency().label());
    }
    if let Some(description) = draft.description() {
        println!("Job:      {description}");
    }
    if let Some(address) = draft.address() {
        println!("Address:  {address}");
    }
    if let Some(date) = draft.preferred_date() {
        let window = if draft.flexible() {
            "any time".to_string()
        } else {
            draft.preferred_time().map_or_else(
                || "any time".to_string(),
                |w| {
                    format!(
                        "{}\u{2013}{}",
                        w.start.format("%H:%M"),
                        w.end.format("%H:%M")
                    )
                },
            )
        };
        println!("Visit:    {date} ({window})");
    }
    if let Some(expert) = draft.expert() {
        println!(
            "Expert:   {} ({:.1}, {} reviews)",
            expert.summary.name, expert.summary.rating, expert.summary.rating_count
        );
    }
    println!("Total:    \u{20b9}{:.2}", draft.pricing().final_price());
    println!();
}
