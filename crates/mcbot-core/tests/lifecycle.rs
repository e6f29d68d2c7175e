use mcbot_core::{BehaviorKind, Lifecycle, Outcome};

#[test]
fn lifecycle_transitions_are_one_way() {
    let mut lc = Lifecycle::default();
    assert_eq!(lc, Lifecycle::Fresh);
    assert!(!lc.try_pause());
    assert!(!lc.try_resume());

    assert!(lc.try_start());
    assert!(!lc.try_start(), "start is not re-entrant");
    assert!(lc.is_running());

    assert!(lc.try_pause());
    assert!(!lc.is_running());
    assert!(!lc.try_start());
    assert!(lc.try_resume());

    assert!(lc.try_stop());
    assert!(!lc.try_stop(), "second stop must be a no-op");
    assert!(!lc.try_start());
    assert!(!lc.try_resume());
}

#[test]
fn kind_parses_both_spellings() {
    assert_eq!("mineBlock".parse::<BehaviorKind>(), Ok(BehaviorKind::MineBlock));
    assert_eq!("mine_block".parse::<BehaviorKind>(), Ok(BehaviorKind::MineBlock));
    assert_eq!("follow".parse::<BehaviorKind>(), Ok(BehaviorKind::FollowPlayer));
    assert!("fly".parse::<BehaviorKind>().is_err());
    assert_eq!(BehaviorKind::DropItems.to_string(), "drop_items");
}

#[test]
fn default_priorities_put_combat_first_and_idle_last() {
    let mut kinds = BehaviorKind::ALL.to_vec();
    kinds.sort_by_key(|k| k.default_priority());
    assert_eq!(kinds.first(), Some(&BehaviorKind::Combat));
    assert_eq!(kinds.last(), Some(&BehaviorKind::Idle));
    assert!(BehaviorKind::MineBlock.default_priority() < BehaviorKind::FollowPlayer.default_priority());
}

#[test]
fn exhausted_counts_as_success() {
    assert!(Outcome::Completed.is_success());
    assert!(Outcome::Exhausted.is_success());
    assert!(!Outcome::Failed("stuck".into()).is_success());
}
