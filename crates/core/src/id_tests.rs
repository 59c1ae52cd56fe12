use super::*;

crate::define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates() {
    let id = TestId::new("instance-0123456789");
    assert_eq!(id.short(8), "instance");
    assert_eq!(id.short(100), "instance-0123456789");
}

#[test]
fn display_matches_inner() {
    let id = TestId::new("abc");
    assert_eq!(id.to_string(), "abc");
}

#[test]
fn eq_against_str() {
    let id = TestId::new("abc");
    assert_eq!(id, "abc");
    assert_eq!(id, *"abc".to_string().as_str());
}

#[test]
fn sequential_id_gen_increments() {
    let gen = SequentialIdGen::new("npc");
    assert_eq!(gen.next(), "npc-1");
    assert_eq!(gen.next(), "npc-2");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
