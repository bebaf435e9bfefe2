//! End-to-end evaluation of the default fixture rule set

use rust_decimal::Decimal;
use testresult::TestResult;

use reward_engine::{
    containers::ContainerType,
    evaluations::{Evaluation, JudgeError, RewardType},
    events::{CardEvent, ChannelEvent, ChannelHit, Event, PayEvent, PayStatus},
    feedback::FeedbackStatus,
    fixtures::Fixture,
    labels::LabelSet,
    payloads::{Payload, PayloadNode},
    registry::{Registry, RegistryError},
    summary::summarize,
};

// 2024-06-01T00:00:00Z, a Saturday in UTC and at UTC+8.
const SATURDAY: i64 = 1_717_200_000;

// 2024-06-03T00:00:00Z, a Monday.
const MONDAY: i64 = 1_717_372_800;

const WINDOW_START: i64 = 1_704_067_200;
const WINDOW_END: i64 = 1_735_689_599;

fn registry() -> TestResult<Registry> {
    let fixture = Fixture::from_sets("default", "default")?;

    Ok(Registry::load(&fixture, &fixture)?)
}

fn channel_hit(id: &str, labels: &[&str]) -> ChannelHit {
    ChannelHit::new(id, LabelSet::from_strs(labels))
}

fn web_shop_event(cost: i64, pay_ids: &[&str]) -> Event {
    Event::new("evt", SATURDAY, cost)
        .with_card(CardEvent::new(RewardType::Currency, LabelSet::empty()))
        .with_pay(PayEvent::new(PayStatus::No, LabelSet::from_strs(pay_ids)))
        .with_channel(ChannelEvent::new(vec![channel_hit(
            "c1",
            &["digital", "online"],
        )]))
}

#[test]
fn channel_and_pay_rewards_add_up() -> TestResult {
    let result = registry()?.judge_by_owner_id("c1", &web_shop_event(500, &["p1"]))?;

    let [channel, pay] = result.payload.children.as_slice() else {
        panic!("Expected two child payloads");
    };

    assert_eq!(channel.feedback.get_return, 50);
    assert_eq!(pay.feedback.get_return, 50);
    assert_eq!(result.feedback.get_return, 100);
    assert_eq!(result.feedback.cost, 500);
    assert!(result.pass());

    Ok(())
}

#[test]
fn below_min_cost_without_pay_method_earns_nothing() -> TestResult {
    let result = registry()?.judge_by_owner_id("c1", &web_shop_event(50, &[]))?;

    let [channel, pay] = result.payload.children.as_slice() else {
        panic!("Expected two child payloads");
    };

    assert_eq!(channel.feedback.status, FeedbackStatus::GetNone);
    assert!(!pay.pass);
    assert!(
        pay.container
            .as_ref()
            .is_some_and(|container| !container.mis_matches.is_empty())
    );
    assert_eq!(result.feedback.get_return, 0);
    assert_eq!(result.feedback.cost, 50);
    assert!(!result.pass());

    Ok(())
}

#[test]
fn summary_lists_matched_channel_and_pay_method() -> TestResult {
    let summary = registry()?.evaluate_by_owner_id("c1", &web_shop_event(500, &["p1"]))?;

    assert_eq!(summary.evaluation_id, "web-shop-cashback");
    assert_eq!(summary.matched_channels, LabelSet::from_strs(&["c1"]));
    assert_eq!(summary.matched_pay_methods, LabelSet::from_strs(&["p1"]));
    assert!(summary.matched_task_labels.is_empty());
    assert_eq!(summary.feedback.get_return, 100);

    Ok(())
}

#[test]
fn validity_window_bounds_are_inclusive() -> TestResult {
    let registry = registry()?;

    for date in [WINDOW_START, WINDOW_END] {
        let mut event = web_shop_event(500, &["p1"]);
        event.date = date;

        assert!(registry.judge_by_owner_id("c1", &event)?.pass());
    }

    for date in [WINDOW_START - 1, WINDOW_END + 1] {
        let mut event = web_shop_event(500, &["p1"]);
        event.date = date;

        assert!(matches!(
            registry.judge_by_owner_id("c1", &event),
            Err(RegistryError::Judge(JudgeError::OutOfValidityWindow { .. }))
        ));
    }

    Ok(())
}

#[test]
fn reward_type_must_match() -> TestResult {
    let mut event = web_shop_event(500, &["p1"]);
    event.card_event = Some(CardEvent::new(RewardType::Point, LabelSet::empty()));

    assert!(matches!(
        registry()?.judge_by_owner_id("c1", &event),
        Err(RegistryError::Judge(JudgeError::RewardTypeMismatch { .. }))
    ));

    Ok(())
}

#[test]
fn weekend_task_rule_pays_tiered_points() -> TestResult {
    let registry = registry()?;

    let event = |date| {
        Event::new("evt", date, 3_000)
            .with_card(CardEvent::new(
                RewardType::Point,
                LabelSet::from_strs(&["t1"]),
            ))
            .with_channel(ChannelEvent::new(vec![channel_hit("c2", &["oversea", "travel"])]))
    };

    let saturday = registry.judge_by_owner_id("card-reward-1", &event(SATURDAY))?;

    // max(5% of 2000 tiered, 3% of 3000 capped at 300)
    assert_eq!(saturday.feedback.get_return, 100);
    assert_eq!(saturday.feedback.status, FeedbackStatus::GetAll);
    assert_eq!(saturday.feedback.get_percentage, Decimal::new(5, 2));

    let monday = registry.judge_by_owner_id("card-reward-1", &event(MONDAY))?;

    assert_eq!(monday.feedback.get_return, 90);
    assert!(monday.pass());

    let summary = summarize(&saturday);

    assert_eq!(summary.matched_task_labels, LabelSet::from_strs(&["t1"]));
    assert_eq!(
        summary.matched_channel_labels,
        LabelSet::from_strs(&["oversea", "travel"])
    );

    Ok(())
}

#[test]
fn xor_rule_rejects_overlapping_rewards() -> TestResult {
    let registry = registry()?;

    let event = |channel: ChannelHit| {
        Event::new("evt", SATURDAY, 800)
            .with_card(CardEvent::new(RewardType::Currency, LabelSet::empty()))
            .with_pay(PayEvent::new(PayStatus::No, LabelSet::from_strs(&["p2"])))
            .with_channel(ChannelEvent::new(vec![channel]))
    };

    // Paying with p2 away from the food court earns both the wallet and the
    // not-food-court reward.
    let web = registry.judge_by_owner_id("p2", &event(channel_hit("c1", &["digital"])))?;

    assert!(!web.pass());
    assert_eq!(web.feedback.get_return, 0);

    let food_court = registry.judge_by_owner_id(
        "p2",
        &event(channel_hit("c3", &["restaurant", "domestic"])),
    )?;

    assert!(food_court.pass());
    assert_eq!(food_court.feedback.get_return, 30);

    Ok(())
}

#[test]
fn missing_channel_event_is_rejected() -> TestResult {
    let mut event = web_shop_event(500, &["p1"]);
    event.channel_event = None;

    assert!(matches!(
        registry()?.evaluate_by_owner_id("c1", &event),
        Err(RegistryError::Judge(JudgeError::MissingSubEvent(_)))
    ));

    Ok(())
}

fn configured_ids(payload: &Payload, ids: &mut Vec<(ContainerType, String)>) {
    match &payload.node {
        PayloadNode::Combine { children, .. } => {
            for child in children {
                configured_ids(child, ids);
            }
        }
        PayloadNode::Gate { container, .. } => ids.extend(
            container
                .configured_ids()
                .into_iter()
                .map(|(kind, id)| (kind, id.to_string())),
        ),
    }
}

#[test]
fn summary_only_reports_configured_ids() -> TestResult {
    let fixture = Fixture::from_sets("default", "default")?;

    let evaluations = fixture
        .records()
        .iter()
        .cloned()
        .map(|record| record.into_evaluation(fixture.channels()))
        .collect::<Result<Vec<Evaluation>, _>>()?;

    let events = [
        web_shop_event(500, &["p1", "p9"]),
        web_shop_event(50, &[]),
        Event::new("evt", SATURDAY, 2_000)
            .with_card(CardEvent::new(
                RewardType::Point,
                LabelSet::from_strs(&["t1", "t2", "t7"]),
            ))
            .with_pay(PayEvent::new(PayStatus::Use, LabelSet::from_strs(&["p2"])))
            .with_channel(ChannelEvent::new(vec![
                channel_hit("c2", &["oversea", "travel", "duty-free"]),
                channel_hit("c9", &["unlisted"]),
            ])),
    ];

    for evaluation in &evaluations {
        let mut ids = Vec::new();
        configured_ids(&evaluation.payload, &mut ids);

        let configured = |kind: ContainerType, id: &str| {
            ids.iter()
                .any(|(configured_kind, configured_id)| *configured_kind == kind && configured_id == id)
        };

        for event in &events {
            let Ok(result) = evaluation.judge(event) else {
                continue;
            };

            let summary = summarize(&result);

            for (kind, matched) in [
                (ContainerType::TaskLabel, &summary.matched_task_labels),
                (ContainerType::Channel, &summary.matched_channels),
                (ContainerType::ChannelLabel, &summary.matched_channel_labels),
                (ContainerType::Pay, &summary.matched_pay_methods),
            ] {
                for id in matched.iter() {
                    assert!(
                        configured(kind, id),
                        "{id} was reported by {} but never configured",
                        evaluation.id
                    );
                }
            }
        }
    }

    Ok(())
}
