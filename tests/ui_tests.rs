//! UI automation tests using egui_kittest and AccessKit
//!
//! These tests drive the deck through its accessibility tree: slide content,
//! header, navigation wraparound, the ROI figures and the demo card.

use egui_kittest::kittest::Queryable;
use egui_kittest::Harness;
use pitchdeck::config::{DeckConfig, GenerationConfig, Niche};
use pitchdeck::deck::Slide;
use pitchdeck::ui::PitchDeckApp;

/// Environment variable that is never set, so the demo has no credential
const UNSET_KEY_ENV: &str = "PITCHDECK_TEST_KEY_THAT_IS_NEVER_SET";

fn config_without_key() -> DeckConfig {
    DeckConfig::default().with_generation(GenerationConfig {
        api_key_env: UNSET_KEY_ENV.to_string(),
        ..GenerationConfig::default()
    })
}

fn deck(config: DeckConfig) -> Harness<'static, PitchDeckApp> {
    let mut harness = Harness::builder()
        .with_size(egui::Vec2::new(1400.0, 1200.0))
        .build_state(
            |ctx, app: &mut PitchDeckApp| app.show(ctx),
            PitchDeckApp::from_config(config),
        );
    harness.run();
    harness
}

fn click(harness: &mut Harness<'static, PitchDeckApp>, label: &str) {
    harness.get_by_label(label).click();
    harness.run();
}

/// Test that the deck opens on the problem slide
#[test]
fn test_opens_on_problem_slide() {
    let harness = deck(config_without_key());

    assert_eq!(harness.state().current_slide(), Slide::Problem);
    let _title = harness.get_by_label("The 5-Minute Rule");
    let _stat = harness.get_by_label("21x");
    let _list = harness.get_by_label("The Reality Check");
    let _item = harness.get_by_label("The After-hours voicemail graveyard");
}

/// Test that the header splits the company name after the first word
#[test]
fn test_header_shows_company_and_tagline() {
    let harness = deck(config_without_key());

    let _first = harness.get_by_label("Kerr");
    let _rest = harness.get_by_label("Design Build");
    let _tagline = harness.get_by_label("AI AUTOMATION PROPOSAL");
}

/// Test that next moves to the solution slide and replaces the content
#[test]
fn test_next_button_shows_solution() {
    let mut harness = deck(config_without_key());

    click(&mut harness, "Next slide");

    assert_eq!(harness.state().current_slide(), Slide::Solution);
    let _button = harness.get_by_label("Start Live Demo");
    let _persona = harness.get_by_label("Sarah");
    let _title = harness.get_by_label("AI Project Evaluator");
    let _status = harness.get_by_label("READY TO TAKE THE CALL...");
    assert!(harness.query_by_label("The Reality Check").is_none());
}

/// Test that previous on the first slide wraps to the offer
#[test]
fn test_previous_wraps_to_last_slide() {
    let mut harness = deck(config_without_key());

    click(&mut harness, "Previous slide");

    assert_eq!(harness.state().current_slide(), Slide::Offer);
    let _book = harness.get_by_label("Book Your Strategy Call");
    let _zero_fees = harness.get_by_label("Zero Setup Fees");
}

/// Test that five steps forward return to the first slide
#[test]
fn test_next_wraps_to_first_slide() {
    let mut harness = deck(config_without_key());

    let expected = [
        Slide::Solution,
        Slide::Roi,
        Slide::Possibilities,
        Slide::Offer,
        Slide::Problem,
    ];
    for slide in expected {
        click(&mut harness, "Next slide");
        assert_eq!(harness.state().current_slide(), slide);
    }
    let _list = harness.get_by_label("The Reality Check");
}

/// Test the ROI slide with the default assumptions
#[test]
fn test_roi_slide_shows_default_figures() {
    let mut harness = deck(config_without_key());

    click(&mut harness, "Next slide");
    click(&mut harness, "Next slide");

    assert_eq!(harness.state().current_slide(), Slide::Roi);
    let _heading = harness.get_by_label("The Cost of Missed Calls");
    let _leads = harness.get_by_label("40");
    let _missed = harness.get_by_label("30%");
    let _job_value = harness.get_by_label("$120,000");
    let _close = harness.get_by_label("15%");
    // recovery is fixed, not a slider
    assert!(harness.query_by_label("AI RECOVERY RATE (%)").is_none());
    assert!(harness.query_by_label("80%").is_none());
    // 12 missed leads x $120,000 x 15% = $216,000 lost, 80% recovered
    let _lift = harness.get_by_label("$172,800");

    let estimate = harness.state().roi().estimate();
    assert_eq!(estimate.lost_revenue, 216_000.0);
}

/// Test that the possibilities slide names the client
#[test]
fn test_possibilities_slide_lists_capabilities() {
    let mut harness = deck(config_without_key());

    for _ in 0..3 {
        click(&mut harness, "Next slide");
    }

    let _dna = harness.get_by_label("Your Business DNA");
    let _pitch = harness.get_by_label(
        "We don't do \"one-size-fits-all.\" We build a bespoke neural architecture for Kerr Design Build.",
    );
    for capability in [
        "24/7 Receptionist",
        "Lead Nurture",
        "Multi-Channel",
        "Support & Dispatch",
    ] {
        let _card = harness.get_by_label(capability);
    }
}

/// Test that starting the demo without a credential explains why
#[test]
fn test_start_without_api_key_shows_message() {
    let mut harness = deck(config_without_key());

    click(&mut harness, "Next slide");
    click(&mut harness, "Start Live Demo");

    let _error = harness.get_by_label("API key missing. Check your environment settings.");
    // nothing was started
    let _button = harness.get_by_label("Start Live Demo");
    assert!(!harness.state().demo().is_live());
    assert!(harness.query_by_label("End Call").is_none());
}

/// Test that leaving the solution slide keeps an idle demo idle
#[test]
fn test_leaving_solution_keeps_idle_status() {
    let mut harness = deck(config_without_key());

    click(&mut harness, "Next slide");
    click(&mut harness, "Next slide");
    click(&mut harness, "Previous slide");

    assert_eq!(harness.state().current_slide(), Slide::Solution);
    let _status = harness.get_by_label("READY TO TAKE THE CALL...");
}

/// Test that a niche preset re-skins the solution slide
#[test]
fn test_niche_preset_changes_persona() {
    let config = Niche::Dentist.apply(config_without_key());
    let mut harness = deck(config);

    click(&mut harness, "Next slide");

    let _headline = harness.get_by_label("24/7 Dental");
    let _highlight = harness.get_by_label("Booking Assistant");
    let _persona = harness.get_by_label("Jessica");
    let _title = harness.get_by_label("AI Booking Assistant");
}
