//! Registry lookups at scale and under concurrent reloads

use std::thread;

use testresult::TestResult;

use reward_engine::{
    containers::{Container, ContainerOperator},
    evaluations::{Evaluation, Owner, OwnerKind, RewardType, ValidityWindow},
    events::{CardEvent, ChannelEvent, Event, PayEvent, PayStatus},
    feedback::Feedback,
    fixtures::Fixture,
    labels::LabelSet,
    payloads::Payload,
    registry::{Registry, RegistryError},
};

const PROMOTIONS: usize = 5_000;

fn pay_evaluation(index: usize, amount: i64) -> Evaluation {
    Evaluation::new(
        format!("eval-{index}"),
        Owner::new(OwnerKind::Pay, format!("pay-{index}")),
        RewardType::Currency,
        ValidityWindow::new(0, i64::MAX),
        Payload::gate(
            format!("gate-{index}"),
            Feedback::fixed(amount),
            Container::pays(
                format!("leaf-{index}"),
                ContainerOperator::And,
                [format!("pay-{index}")],
            ),
        ),
    )
}

fn pay_event(pay_id: &str) -> Event {
    Event::new("evt", 1_000, 250)
        .with_card(CardEvent::new(RewardType::Currency, LabelSet::empty()))
        .with_pay(PayEvent::new(PayStatus::No, LabelSet::from_strs(&[pay_id])))
        .with_channel(ChannelEvent::default())
}

#[test]
fn every_owner_resolves_to_its_own_evaluation() -> TestResult {
    let registry = Registry::new(
        (0..PROMOTIONS)
            .map(|index| pay_evaluation(index, 1))
            .collect(),
    );

    assert_eq!(registry.len(), PROMOTIONS);

    for index in (0..PROMOTIONS).step_by(97).chain([PROMOTIONS - 1]) {
        let owner_id = format!("pay-{index}");
        let summary = registry.evaluate_by_owner_id(&owner_id, &pay_event(&owner_id))?;

        assert_eq!(summary.evaluation_id, format!("eval-{index}"));
        assert!(summary.pass);
        assert_eq!(summary.matched_pay_methods, LabelSet::from_strs(&[owner_id.as_str()]));
    }

    assert!(matches!(
        registry.evaluate_by_owner_id("pay-missing", &pay_event("pay-missing")),
        Err(RegistryError::UnknownOwnerId(_))
    ));

    Ok(())
}

#[test]
fn empty_registry_knows_no_owner() {
    let registry = Registry::default();

    assert!(registry.is_empty());
    assert!(registry.owner_ids().is_empty());
    assert!(matches!(
        registry.judge_by_owner_id("pay-0", &pay_event("pay-0")),
        Err(RegistryError::UnknownOwnerId(_))
    ));
}

#[test]
fn concurrent_judges_see_whole_snapshots() -> TestResult {
    let fixture = Fixture::from_sets("default", "default")?;
    let registry = Registry::load(&fixture, &fixture)?;

    let event = Event::new("evt", 1_717_200_000, 500)
        .with_card(CardEvent::new(RewardType::Currency, LabelSet::empty()))
        .with_pay(PayEvent::new(PayStatus::No, LabelSet::from_strs(&["p1"])))
        .with_channel(ChannelEvent::new(vec![
            reward_engine::events::ChannelHit::new("c1", LabelSet::from_strs(&["digital"])),
        ]));

    thread::scope(|scope| {
        let judges: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..200)
                        .map(|_| registry.evaluate_by_owner_id("c1", &event))
                        .filter(|summary| {
                            !matches!(summary, Ok(summary) if summary.feedback.get_return == 100)
                        })
                        .count()
                })
            })
            .collect();

        for _ in 0..50 {
            assert!(matches!(registry.reload(&fixture, &fixture), Ok(3)));
        }

        for judge in judges {
            assert!(matches!(judge.join(), Ok(0)));
        }
    });

    Ok(())
}
