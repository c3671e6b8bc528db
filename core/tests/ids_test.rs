use crowdpad_core::IdGenerator;

#[test]
fn ids_are_lowercase_alphanumeric() {
    let ids = IdGenerator::new();
    for id in [ids.generate_action_id(), ids.generate_message_id()] {
        assert_eq!(id.len(), 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }
}

#[test]
fn consecutive_ids_differ() {
    let ids = IdGenerator::new();
    assert_ne!(ids.generate_action_id(), ids.generate_action_id());
    assert_ne!(ids.generate_message_id(), ids.generate_message_id());
    assert_ne!(ids.generate_action_id(), ids.generate_message_id());
}
